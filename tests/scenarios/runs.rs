use std::time::Duration;

use crate::support::helpers::{
    assert_is_contiguous, init_tracing, processor_with_delay, record_events,
};
use anyhow::Result;
use seqdelay::{ProcessError, RunInput, RunOutcome};
use serde_json::json;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn default_numbers_are_revealed_one_second_apart() -> Result<()> {
    init_tracing();
    let processor = processor_with_delay(1)?;
    let log = record_events(processor.subscribe_events(), 1);

    let outcome = processor.start(vec![1_i64, 8, 3, 4, 5]).await;
    let log = log.await??;

    assert_eq!(outcome, RunOutcome::Completed { published: 5 });
    assert_eq!(log.values(), vec![1.0, 8.0, 3.0, 4.0, 5.0]);
    assert_eq!(log.indices(), vec![0, 1, 2, 3, 4]);
    for entry in &log.published {
        assert_eq!(
            entry.at,
            Duration::from_secs(entry.index as u64 + 1),
            "index {} published off schedule",
            entry.index
        );
    }

    let state = processor.state();
    assert_eq!(state.current_value, Some(5.0));
    assert_eq!(state.current_index, 4);
    assert!(!state.is_running);
    assert_eq!(state.last_error, None);
    assert_eq!(state.progress_percent(5), 100.0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn every_numeric_sequence_publishes_each_item_in_order() -> Result<()> {
    init_tracing();
    let cases: Vec<(Vec<f64>, u64)> = vec![
        (vec![42.0], 1),
        (vec![-1.5, 0.0, 2.25], 2),
        (vec![9.0, 9.0, 9.0, 9.0], 3),
        ((0..12).map(f64::from).collect(), 1),
    ];

    for (items, delay_secs) in cases {
        let processor = processor_with_delay(delay_secs)?;
        let log = record_events(processor.subscribe_events(), 1);

        let outcome = processor.start(items.clone()).await;
        let log = log.await??;

        assert_eq!(outcome, RunOutcome::Completed { published: items.len() });
        assert_eq!(log.values(), items);
        assert_is_contiguous(&log.indices());

        let delay = Duration::from_secs(delay_secs);
        let mut previous = Duration::ZERO;
        for entry in &log.published {
            assert!(
                entry.at >= previous + delay,
                "index {} published {:?} after the previous one, delay is {:?}",
                entry.index,
                entry.at - previous,
                delay
            );
            previous = entry.at;
        }
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn empty_input_reports_error_without_publishing() -> Result<()> {
    init_tracing();
    let processor = processor_with_delay(1)?;
    let log = record_events(processor.subscribe_events(), 1);
    let started = Instant::now();

    let outcome = processor.start(Vec::<f64>::new()).await;

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(outcome.error(), Some(&ProcessError::EmptyInput));
    let log = log.await??;
    assert!(log.published.is_empty());

    let state = processor.state();
    assert_eq!(state.last_error.as_deref(), Some("Array is empty"));
    assert_eq!(state.current_value, None);
    assert_eq!(state.current_index, 0);
    assert!(!state.is_running);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn non_numeric_element_at_k_allows_exactly_k_publications() -> Result<()> {
    init_tracing();
    for k in 0..4 {
        let mut items: Vec<serde_json::Value> = (1..=5).map(|n| json!(n)).collect();
        items[k] = json!({"not": "a number"});

        let processor = processor_with_delay(1)?;
        let log = record_events(processor.subscribe_events(), 1);
        let outcome = processor.start(serde_json::Value::Array(items)).await;
        let log = log.await??;

        assert_eq!(
            outcome,
            RunOutcome::Failed {
                published: k,
                error: ProcessError::NonNumericElement { index: k },
            }
        );
        assert_eq!(log.indices(), (0..k).collect::<Vec<_>>());

        let state = processor.state();
        assert_eq!(
            state.last_error.as_deref(),
            Some("Array contains non-number elements")
        );
        assert!(!state.is_running);
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn externally_supplied_json_is_validated() -> Result<()> {
    init_tracing();
    let processor = processor_with_delay(1)?;

    let input: RunInput = "\"not a list\"".parse()?;
    let outcome = processor.start(input).await;
    assert_eq!(outcome.error(), Some(&ProcessError::InvalidInput));
    assert_eq!(
        processor.state().last_error.as_deref(),
        Some("Input is not an array")
    );

    let input: RunInput = "[3, 1.5]".parse()?;
    let outcome = processor.start(input).await;
    assert!(outcome.is_completed());
    assert_eq!(processor.state().last_error, None);
    assert_eq!(processor.state().current_value, Some(1.5));
    Ok(())
}
