use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokenbridge::{EncodeOption, EncodeOptions, Engine, RawEncoding, Result, Tokenizer, TokenizerError};

/// Engine that echoes text lengths and counts releases and overlapping calls.
#[derive(Default)]
struct Counters {
    released: AtomicUsize,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct CountingEngine {
    counters: Arc<Counters>,
    /// Return an attention mask one entry short
    broken: bool,
}

impl CountingEngine {
    fn boxed(counters: &Arc<Counters>) -> Box<dyn Engine> {
        Box::new(Self { counters: counters.clone(), broken: false })
    }
}

impl Engine for CountingEngine {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn encode(&self, text: &str, _options: &EncodeOptions) -> Result<RawEncoding> {
        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(2));
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);

        let ids: Vec<u32> = text.bytes().map(u32::from).collect();
        let mask_len = if self.broken { ids.len().saturating_sub(1) } else { ids.len() };
        // Fills every field regardless of what was requested
        Ok(RawEncoding {
            type_ids: Some(vec![0; ids.len()]),
            tokens: Some(text.chars().map(String::from).collect()),
            special_tokens_mask: Some(vec![0; ids.len()]),
            attention_mask: Some(vec![1; mask_len]),
            offsets: Some((0..ids.len()).map(|i| (i, i + 1)).collect()),
            ids,
        })
    }

    fn decode(&self, ids: &[u32], _skip_special_tokens: bool) -> Result<String> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ids.iter().filter_map(|id| char::from_u32(*id)).collect())
    }

    fn vocab_size(&self) -> u32 {
        256
    }
}

impl Drop for CountingEngine {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_close_releases_once() {
    let counters = Arc::new(Counters::default());
    let tokenizer = Tokenizer::from_engine(CountingEngine::boxed(&counters));
    assert!(!tokenizer.is_closed());

    tokenizer.close();
    tokenizer.close();
    assert!(tokenizer.is_closed());
    assert_eq!(counters.released.load(Ordering::SeqCst), 1);

    drop(tokenizer);
    assert_eq!(counters.released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_drop_releases() {
    let counters = Arc::new(Counters::default());
    drop(Tokenizer::from_engine(CountingEngine::boxed(&counters)));
    assert_eq!(counters.released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_closed_handle_never_reaches_engine() {
    let counters = Arc::new(Counters::default());
    let tokenizer = Tokenizer::from_engine(CountingEngine::boxed(&counters));
    assert_eq!(tokenizer.encode("ab", false, &[]).unwrap().ids, vec![97, 98]);
    tokenizer.close();
    let calls = counters.calls.load(Ordering::SeqCst);

    assert!(matches!(tokenizer.encode("ab", false, &[]), Err(TokenizerError::Closed)));
    assert!(matches!(tokenizer.encode_batch(&["ab"], false, &[]), Err(TokenizerError::Closed)));
    assert!(matches!(tokenizer.decode(&[97], true), Err(TokenizerError::Closed)));
    assert_eq!(tokenizer.vocab_size(), 0);

    // Empty inputs short-circuit
    assert_eq!(tokenizer.decode(&[], true).unwrap(), "");
    assert!(tokenizer.encode_batch(&[], true, &[]).unwrap().is_empty());

    assert_eq!(counters.calls.load(Ordering::SeqCst), calls);
}

#[test]
fn test_closed_error_message() {
    let counters = Arc::new(Counters::default());
    let tokenizer = Tokenizer::from_engine(CountingEngine::boxed(&counters));
    tokenizer.close();
    let err = tokenizer.encode("x", true, &[]).unwrap_err();
    assert_eq!(err.to_string(), "Tokenizer is closed");
}

#[test]
fn test_unrequested_fields_dropped() {
    let counters = Arc::new(Counters::default());
    let tokenizer = Tokenizer::from_engine(CountingEngine::boxed(&counters));
    let encoding = tokenizer.encode("abc", false, &[EncodeOption::ReturnOffsets]).unwrap();
    assert_eq!(encoding.offsets, Some(vec![(0, 1), (1, 2), (2, 3)]));
    assert!(encoding.tokens.is_none());
    assert!(encoding.attention_mask.is_none());
    assert!(encoding.type_ids.is_none());
    assert!(encoding.special_tokens_mask.is_none());
}

#[test]
fn test_mismatched_lengths_rejected() {
    let counters = Arc::new(Counters::default());
    let tokenizer = Tokenizer::from_engine(Box::new(CountingEngine { counters: counters.clone(), broken: true }));
    assert!(matches!(
        tokenizer.encode("abc", false, &[EncodeOption::ReturnAttentionMask]),
        Err(TokenizerError::EncodeFailed(_))
    ));
    // The short mask is never materialized when not requested
    assert!(tokenizer.encode("abc", false, &[EncodeOption::ReturnTokens]).is_ok());
}

#[test]
fn test_default_batch_uses_encode() {
    let counters = Arc::new(Counters::default());
    let tokenizer = Tokenizer::from_engine(CountingEngine::boxed(&counters));
    let encodings = tokenizer.encode_batch(&["a", "bc"], false, &[]).unwrap();
    assert_eq!(encodings[0].ids, vec![97]);
    assert_eq!(encodings[1].ids, vec![98, 99]);
}

#[test]
fn test_calls_on_one_handle_are_serialized() {
    let counters = Arc::new(Counters::default());
    let tokenizer = Arc::new(Tokenizer::from_engine(CountingEngine::boxed(&counters)));

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let tokenizer = tokenizer.clone();
            thread::spawn(move || {
                for _ in 0..5 {
                    let text = format!("worker {}", i);
                    let encoding = tokenizer.encode(&text, false, &[]).unwrap();
                    assert_eq!(encoding.len(), text.len());
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(counters.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(counters.calls.load(Ordering::SeqCst), 40);
}

#[test]
fn test_close_while_shared() {
    let counters = Arc::new(Counters::default());
    let tokenizer = Arc::new(Tokenizer::from_engine(CountingEngine::boxed(&counters)));
    let other = tokenizer.clone();
    thread::spawn(move || other.close()).join().unwrap();

    assert!(tokenizer.is_closed());
    assert!(matches!(tokenizer.encode("a", false, &[]), Err(TokenizerError::Closed)));
    assert_eq!(counters.released.load(Ordering::SeqCst), 1);
}
