use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sw_decode::{
    BeamParams, BeamSearchDecoder, DecodeError, GeneratorConfig, GreedyDecoder, GreedyParams,
    Predictor, SequenceDecoder,
};
use sw_model::{
    CharTokenizer, EncodedContext, ModelError, SwipeModel, TouchSample, Trajectory, Vocab,
};

const SOS: u32 = 0;
const EOS: u32 = 1;

/// Vocabulary `<sos> <eos> a b c`.
fn tokenizer() -> Arc<CharTokenizer> {
    let tokens = ["<sos>", "<eos>", "a", "b", "c"].iter().map(|s| s.to_string()).collect();
    Arc::new(CharTokenizer::new(Vocab::from_tokens(tokens).unwrap()))
}

/// Deterministic model whose distribution depends on the prefix length
/// and the last token, with a step-call counter.
struct Scripted {
    vocab: usize,
    steps: Arc<AtomicUsize>,
    encodes: Arc<AtomicUsize>,
}

impl Scripted {
    fn new() -> Self {
        Self {
            vocab: 5,
            steps: Arc::new(AtomicUsize::new(0)),
            encodes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl SwipeModel for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn encode(&self, trajectory: &Trajectory) -> Result<EncodedContext, ModelError> {
        self.encodes.fetch_add(1, Ordering::SeqCst);
        let keys: Vec<f32> = trajectory.valid_samples().map(|(k, _)| k as f32).collect();
        EncodedContext::new(keys, 1)
    }

    fn step(&self, context: &EncodedContext, tokens: &[u32]) -> Result<Vec<f32>, ModelError> {
        self.steps.fetch_add(1, Ordering::SeqCst);
        let len = tokens.len() as f32;
        let last = *tokens.last().unwrap_or(&SOS) as f32;
        let bias = context.as_slice().iter().sum::<f32>();
        let logits: Vec<f32> = (0..self.vocab)
            .map(|t| {
                let t = t as f32;
                if t == EOS as f32 {
                    len * 0.8 - 2.0
                } else {
                    ((t * 1.3 + last * 0.7 + bias * 0.1).sin()) * 1.5
                }
            })
            .collect();
        let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let sum: f32 = logits.iter().map(|l| (l - max).exp()).sum();
        Ok(logits.iter().map(|l| l - max - sum.ln()).collect())
    }

    fn vocab_size(&self) -> usize {
        self.vocab
    }
}

/// Never ranks `<eos>` first, so greedy runs to the cap.
struct NeverEnds;

impl SwipeModel for NeverEnds {
    fn name(&self) -> &str {
        "never_ends"
    }
    fn encode(&self, _: &Trajectory) -> Result<EncodedContext, ModelError> {
        EncodedContext::new(vec![1.0], 1)
    }
    fn step(&self, _: &EncodedContext, _: &[u32]) -> Result<Vec<f32>, ModelError> {
        Ok(vec![0.05f32.ln(), 0.05f32.ln(), 0.8f32.ln(), 0.05f32.ln(), 0.05f32.ln()])
    }
    fn vocab_size(&self) -> usize {
        5
    }
}

/// Emits `<eos>` with probability 0.7 from the start.
struct EosFirst;

impl SwipeModel for EosFirst {
    fn name(&self) -> &str {
        "eos_first"
    }
    fn encode(&self, _: &Trajectory) -> Result<EncodedContext, ModelError> {
        EncodedContext::new(vec![1.0], 1)
    }
    fn step(&self, _: &EncodedContext, _: &[u32]) -> Result<Vec<f32>, ModelError> {
        Ok(vec![0.05f32.ln(), 0.7f32.ln(), 0.15f32.ln(), 0.05f32.ln(), 0.05f32.ln()])
    }
    fn vocab_size(&self) -> usize {
        5
    }
}

struct NanAfter(usize);

impl SwipeModel for NanAfter {
    fn name(&self) -> &str {
        "nan_after"
    }
    fn encode(&self, _: &Trajectory) -> Result<EncodedContext, ModelError> {
        EncodedContext::new(vec![1.0], 1)
    }
    fn step(&self, _: &EncodedContext, tokens: &[u32]) -> Result<Vec<f32>, ModelError> {
        if tokens.len() > self.0 {
            return Ok(vec![f32::NAN; 5]);
        }
        Ok(vec![0.05f32.ln(), 0.05f32.ln(), 0.8f32.ln(), 0.05f32.ln(), 0.05f32.ln()])
    }
    fn vocab_size(&self) -> usize {
        5
    }
}

/// Reports a vocabulary of 5 but returns 4 log-probabilities.
struct ShortOutput;

impl SwipeModel for ShortOutput {
    fn name(&self) -> &str {
        "short"
    }
    fn encode(&self, _: &Trajectory) -> Result<EncodedContext, ModelError> {
        EncodedContext::new(vec![1.0], 1)
    }
    fn step(&self, _: &EncodedContext, _: &[u32]) -> Result<Vec<f32>, ModelError> {
        Ok(vec![-1.0; 4])
    }
    fn vocab_size(&self) -> usize {
        5
    }
}

fn swipe(keys: &[u32]) -> Trajectory {
    let samples: Vec<TouchSample> = keys
        .iter()
        .enumerate()
        .map(|(i, &k)| TouchSample::at(k, i as f32 * 0.1, 0.5))
        .collect();
    Trajectory::from_samples(&samples)
}

fn beam(width: usize, max_steps: usize) -> GeneratorConfig {
    GeneratorConfig::Beam(BeamParams {
        beam_width: width,
        max_steps,
        dedupe_words: false,
    })
}

#[test]
fn test_greedy_respects_step_cap() {
    let out = GreedyDecoder::new(SOS, EOS, 7).decode(&NeverEnds, &swipe(&[2, 3])).unwrap();
    assert_eq!(out.len(), 1);
    // <sos> plus one token per step
    assert_eq!(out[0].tokens.len(), 8);
    assert!(!out[0].tokens.contains(&EOS));

    let predictor = Predictor::new(
        Box::new(NeverEnds),
        &GeneratorConfig::Greedy(GreedyParams { max_steps: 7 }),
        tokenizer(),
    )
    .unwrap();
    let list = predictor.predict(&swipe(&[2, 3])).unwrap();
    assert_eq!(list.words(), vec!["aaaaaaa"]);
}

#[test]
fn test_words_contain_no_control_tokens() {
    let predictor = Predictor::new(Box::new(Scripted::new()), &beam(4, 12), tokenizer()).unwrap();
    let list = predictor.predict(&swipe(&[2, 4, 3])).unwrap();
    for p in &list {
        assert!(p.word.chars().all(|c| "abc".contains(c)), "word {:?}", p.word);
    }
}

#[test]
fn test_beam_list_is_bounded_and_sorted() {
    for width in 1..=5 {
        let predictor =
            Predictor::new(Box::new(Scripted::new()), &beam(width, 10), tokenizer()).unwrap();
        let list = predictor.predict(&swipe(&[3, 2, 4, 2])).unwrap();
        assert!(!list.is_empty());
        assert!(list.len() <= width);
        let scores: Vec<f32> = list.iter().map(|p| p.score).collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]), "unsorted {:?}", scores);
        assert!(scores.iter().all(|s| s.is_finite() && *s >= 0.0));
    }
}

#[test]
fn test_decoding_is_deterministic() {
    let traj = swipe(&[4, 4, 2, 3]);
    let a = Predictor::new(Box::new(Scripted::new()), &beam(3, 15), tokenizer())
        .unwrap()
        .predict(&traj)
        .unwrap();
    let b = Predictor::new(Box::new(Scripted::new()), &beam(3, 15), tokenizer())
        .unwrap()
        .predict(&traj)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_width_one_beam_matches_greedy() {
    let cases: [&[u32]; 3] = [&[2], &[3, 4], &[4, 2, 3, 2]];
    for keys in cases {
        let traj = swipe(keys);
        let greedy = GreedyDecoder::new(SOS, EOS, 20).decode(&Scripted::new(), &traj).unwrap();
        let beam = BeamSearchDecoder::new(SOS, EOS, 1, 20).decode(&Scripted::new(), &traj).unwrap();
        assert_eq!(greedy, beam);
    }
}

#[test]
fn test_empty_trajectory_never_steps() {
    for decoder in [
        Box::new(GreedyDecoder::new(SOS, EOS, 10)) as Box<dyn SequenceDecoder>,
        Box::new(BeamSearchDecoder::new(SOS, EOS, 4, 10)),
    ] {
        let model = Scripted::new();
        let steps = model.steps.clone();
        let encodes = model.encodes.clone();
        let padded = Trajectory::empty().padded_to(6, 0);
        let out = decoder.decode(&model, &padded).unwrap();
        assert_eq!(steps.load(Ordering::SeqCst), 0, "{}", decoder.name());
        assert_eq!(encodes.load(Ordering::SeqCst), 0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tokens, vec![SOS]);
        assert_eq!(out[0].score, 0.0);
    }
}

#[test]
fn test_greedy_eos_first_gives_empty_word() {
    let predictor =
        Predictor::new(Box::new(EosFirst), &GeneratorConfig::default(), tokenizer()).unwrap();
    let list = predictor.predict(&swipe(&[2])).unwrap();
    assert_eq!(list.len(), 1);
    let best = list.best().unwrap();
    assert_eq!(best.word, "");
    assert!((best.score - (-0.7f32.ln())).abs() < 1e-5);
}

#[test]
fn test_beam_eos_first_ranks_empty_word_best() {
    let predictor = Predictor::new(Box::new(EosFirst), &beam(3, 10), tokenizer()).unwrap();
    let list = predictor.predict(&swipe(&[2])).unwrap();
    assert_eq!(list.best().unwrap().word, "");
    assert!(list.len() <= 3);
}

#[test]
fn test_nan_log_probability_is_reported() {
    let greedy = GreedyDecoder::new(SOS, EOS, 10).decode(&NanAfter(3), &swipe(&[2]));
    assert!(matches!(greedy, Err(DecodeError::NumericFault { step: 3, .. })));
    let beam = BeamSearchDecoder::new(SOS, EOS, 2, 10).decode(&NanAfter(1), &swipe(&[2]));
    assert!(matches!(beam, Err(DecodeError::NumericFault { .. })));
}

#[test]
fn test_short_step_output_is_a_vocab_mismatch() {
    let err = GreedyDecoder::new(SOS, EOS, 10).decode(&ShortOutput, &swipe(&[2])).unwrap_err();
    assert!(matches!(err, DecodeError::VocabMismatch { expected: 5, got: 4 }));
}
