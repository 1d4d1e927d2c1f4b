// tests/flow_tests.rs
mod common;

use common::*;
use grocer::flow::{FlowOutcome, Pipeline, Shared, SkipCondition, StepControl};
use grocer::FlowError;
use serial_test::serial;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
enum TestError {
  #[error("Step failed: {0}")]
  Step(String),
  #[error("Undo failed: {0}")]
  Undo(String),
  #[error(transparent)]
  Flow(#[from] FlowError),
}

#[derive(Debug, Default)]
struct Trace {
  log: Vec<String>,
  counter: i32,
}

fn push(ctx: &Shared<Trace>, entry: &str) {
  ctx.write().log.push(entry.to_string());
}

fn three_steps() -> Pipeline<Trace, TestError> {
  Pipeline::new(&[("one", false, None), ("two", false, None), ("three", false, None)])
}

#[tokio::test]
#[serial]
async fn test_steps_and_handlers_run_in_order() {
  setup_tracing();
  let mut p = three_steps();
  for step in ["one", "two", "three"] {
    p.on_step(step, move |ctx: Shared<Trace>| {
      Box::pin(async move {
        push(&ctx, step);
        Ok::<_, TestError>(StepControl::Continue)
      })
    });
  }
  p.on_step("two", |ctx: Shared<Trace>| {
    Box::pin(async move {
      push(&ctx, "two-b");
      Ok::<_, TestError>(StepControl::Continue)
    })
  });

  let ctx = Shared::new(Trace::default());
  let outcome = p.run(ctx.clone()).await.expect("pipeline should complete");

  assert_eq!(outcome, FlowOutcome::Completed);
  assert_eq!(ctx.read().log, vec!["one", "two", "two-b", "three"]);
  assert_eq!(p.step_names(), vec!["one", "two", "three"]);
}

#[tokio::test]
#[serial]
async fn test_stop_halts_without_compensation() {
  setup_tracing();
  let mut p = three_steps();
  p.on_step("one", |ctx: Shared<Trace>| {
    Box::pin(async move {
      push(&ctx, "one");
      Ok::<_, TestError>(StepControl::Continue)
    })
  });
  p.compensate_step("one", |ctx: Shared<Trace>| {
    Box::pin(async move {
      push(&ctx, "undo-one");
      Ok::<_, TestError>(())
    })
  });
  p.on_step("two", |_ctx: Shared<Trace>| Box::pin(async move { Ok::<_, TestError>(StepControl::Stop) }));
  p.on_step("three", |ctx: Shared<Trace>| {
    Box::pin(async move {
      push(&ctx, "three");
      Ok::<_, TestError>(StepControl::Continue)
    })
  });

  let ctx = Shared::new(Trace::default());
  let outcome = p.run(ctx.clone()).await.expect("stop is not an error");

  assert_eq!(outcome, FlowOutcome::Stopped);
  assert_eq!(ctx.read().log, vec!["one"]);
}

#[tokio::test]
#[serial]
async fn test_failure_compensates_completed_steps_in_reverse() {
  setup_tracing();
  let mut p = Pipeline::<Trace, TestError>::new(&[
    ("reserve", false, None),
    ("charge", false, None),
    ("ship", false, None),
    ("notify", false, None),
  ]);
  for step in ["reserve", "charge"] {
    p.on_step(step, move |ctx: Shared<Trace>| {
      Box::pin(async move {
        push(&ctx, step);
        Ok::<_, TestError>(StepControl::Continue)
      })
    });
    p.compensate_step(step, move |ctx: Shared<Trace>| {
      Box::pin(async move {
        push(&ctx, &format!("undo-{step}"));
        Ok::<_, TestError>(())
      })
    });
  }
  p.on_step("ship", |_ctx: Shared<Trace>| {
    Box::pin(async move { Err::<StepControl, _>(TestError::Step("warehouse closed".to_string())) })
  });
  p.compensate_step("ship", |ctx: Shared<Trace>| {
    Box::pin(async move {
      push(&ctx, "undo-ship");
      Ok::<_, TestError>(())
    })
  });
  p.on_step("notify", |ctx: Shared<Trace>| {
    Box::pin(async move {
      push(&ctx, "notify");
      Ok::<_, TestError>(StepControl::Continue)
    })
  });

  let ctx = Shared::new(Trace::default());
  let result = p.run(ctx.clone()).await;

  assert!(matches!(result, Err(TestError::Step(ref m)) if m == "warehouse closed"));
  // The failing step itself is not compensated, and later steps never run.
  assert_eq!(ctx.read().log, vec!["reserve", "charge", "undo-charge", "undo-reserve"]);
}

#[tokio::test]
#[serial]
async fn test_compensation_failure_does_not_mask_original_error() {
  setup_tracing();
  let mut p = three_steps();
  p.on_step("one", |ctx: Shared<Trace>| {
    Box::pin(async move {
      push(&ctx, "one");
      Ok::<_, TestError>(StepControl::Continue)
    })
  });
  p.compensate_step("one", |ctx: Shared<Trace>| {
    Box::pin(async move {
      push(&ctx, "undo-one");
      Ok::<_, TestError>(())
    })
  });
  p.on_step("two", |_ctx: Shared<Trace>| Box::pin(async move { Ok::<_, TestError>(StepControl::Continue) }));
  p.compensate_step("two", |_ctx: Shared<Trace>| {
    Box::pin(async move { Err::<(), _>(TestError::Undo("disk full".to_string())) })
  });
  p.on_step("three", |_ctx: Shared<Trace>| {
    Box::pin(async move { Err::<StepControl, _>(TestError::Step("boom".to_string())) })
  });

  let ctx = Shared::new(Trace::default());
  let result = p.run(ctx.clone()).await;

  assert!(matches!(result, Err(TestError::Step(_))));
  assert_eq!(ctx.read().log, vec!["one", "undo-one"]);
}

#[tokio::test]
#[serial]
async fn test_skip_condition_is_evaluated_against_current_context() {
  setup_tracing();
  let skip_if_big: SkipCondition<Trace> = Arc::new(|ctx: &Shared<Trace>| ctx.read().counter > 5);
  let mut p = Pipeline::<Trace, TestError>::new(&[("bump", false, None), ("only_if_small", false, Some(skip_if_big))]);
  p.on_step("bump", |ctx: Shared<Trace>| {
    Box::pin(async move {
      ctx.write().counter += 10;
      Ok::<_, TestError>(StepControl::Continue)
    })
  });
  p.on_step("only_if_small", |ctx: Shared<Trace>| {
    Box::pin(async move {
      push(&ctx, "ran");
      Ok::<_, TestError>(StepControl::Continue)
    })
  });

  let ctx = Shared::new(Trace::default());
  p.run(ctx.clone()).await.expect("pipeline should complete");
  assert!(ctx.read().log.is_empty());

  p.set_skip_condition("only_if_small", None).expect("step exists");
  let ctx = Shared::new(Trace::default());
  p.run(ctx.clone()).await.expect("pipeline should complete");
  assert_eq!(ctx.read().log, vec!["ran"]);
}

#[tokio::test]
#[serial]
async fn test_required_step_without_handler_fails() {
  setup_tracing();
  let mut p = Pipeline::<Trace, TestError>::new(&[("first", false, None), ("second", false, None)]);
  p.on_step("first", |ctx: Shared<Trace>| {
    Box::pin(async move {
      push(&ctx, "first");
      Ok::<_, TestError>(StepControl::Continue)
    })
  });
  p.compensate_step("first", |ctx: Shared<Trace>| {
    Box::pin(async move {
      push(&ctx, "undo-first");
      Ok::<_, TestError>(())
    })
  });

  let ctx = Shared::new(Trace::default());
  let result = p.run(ctx.clone()).await;

  match result {
    Err(TestError::Flow(FlowError::HandlerMissing { step_name })) => assert_eq!(step_name, "second"),
    other => panic!("expected HandlerMissing, got {other:?}"),
  }
  assert_eq!(ctx.read().log, vec!["first", "undo-first"]);
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handler_is_skipped() {
  setup_tracing();
  let mut p = Pipeline::<Trace, TestError>::new(&[("audit", true, None), ("work", false, None)]);
  p.on_step("work", |ctx: Shared<Trace>| {
    Box::pin(async move {
      push(&ctx, "work");
      Ok::<_, TestError>(StepControl::Continue)
    })
  });

  let ctx = Shared::new(Trace::default());
  let outcome = p.run(ctx.clone()).await.expect("pipeline should complete");
  assert_eq!(outcome, FlowOutcome::Completed);
  assert_eq!(ctx.read().log, vec!["work"]);
}

#[test]
fn test_set_skip_condition_on_unknown_step_fails() {
  let mut p = three_steps();
  match p.set_skip_condition("four", None) {
    Err(FlowError::StepNotFound { step_name }) => assert_eq!(step_name, "four"),
    other => panic!("expected StepNotFound, got {other:?}"),
  }
}

#[test]
#[should_panic(expected = "not found in pipeline definition")]
fn test_registering_unknown_step_panics() {
  let mut p = three_steps();
  p.on_step("four", |_ctx: Shared<Trace>| Box::pin(async move { Ok::<_, TestError>(StepControl::Continue) }));
}

#[test]
fn test_shared_clones_see_the_same_data() {
  let a = Shared::new(Trace::default());
  let b = a.clone();
  b.write().counter = 42;
  assert_eq!(a.read().counter, 42);
  let log = a.map_read(|t| &t.log);
  assert!(log.is_empty());
}
