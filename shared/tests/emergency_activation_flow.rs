use crux_core::testing::AppTester;
use crux_core::Request;
use urban_safety_shared::capabilities::{
    HapticsOperation, NavigatorOperation, TimerOperation, TimerOutput,
};
use urban_safety_shared::emergency::ActivationPhase;
use urban_safety_shared::{App, Effect, Event, Model, Route};

fn started_timers(effects: Vec<Effect>) -> Vec<Request<TimerOperation>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Timer(request) => Some(request),
            _ => None,
        })
        .filter(|request| matches!(request.operation, TimerOperation::Start { .. }))
        .collect()
}

fn cancelled_timers(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| {
            matches!(effect, Effect::Timer(request)
                if matches!(request.operation, TimerOperation::Cancel { .. }))
        })
        .count()
}

fn vibrations(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| {
            matches!(effect, Effect::Haptics(request)
                if request.operation == HapticsOperation::Vibrate { millis: 1_000 })
        })
        .count()
}

fn navigations_to(effects: &[Effect], route: Route) -> usize {
    effects
        .iter()
        .filter(|effect| {
            matches!(effect, Effect::Navigator(request)
                if matches!(&request.operation, NavigatorOperation::GoTo { route: r, .. } if *r == route))
        })
        .count()
}

/// Resolves `request` as fired and feeds the resulting events back in.
fn fire(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    request: &mut Request<TimerOperation>,
) -> Vec<Effect> {
    let update = app
        .resolve(request, TimerOutput::Fired)
        .expect("timer request resolves");
    let mut effects = Vec::new();
    for event in update.events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

fn on_help_page() -> (AppTester<App, Effect>, Model) {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(Event::Navigate(Route::EmergencyHelp), &mut model);
    (app, model)
}

#[test]
fn test_three_quick_presses_arm_the_countdown() {
    let (app, mut model) = on_help_page();

    let first = app.update(Event::EmergencyPressed, &mut model);
    assert_eq!(model.emergency.press_count(), 1);
    assert_eq!(started_timers(first.effects).len(), 1);

    app.update(Event::EmergencyPressed, &mut model);
    assert_eq!(model.emergency.press_count(), 2);

    let third = app.update(Event::EmergencyPressed, &mut model);
    assert_eq!(model.emergency.phase(), ActivationPhase::Armed { remaining: 5 });
    assert_eq!(vibrations(&third.effects), 1);
    // The pending reset window is cancelled on arming.
    assert_eq!(cancelled_timers(&third.effects), 1);
}

#[test]
fn test_two_presses_then_pause_resets_count() {
    let (app, mut model) = on_help_page();

    app.update(Event::EmergencyPressed, &mut model);
    let second = app.update(Event::EmergencyPressed, &mut model);
    let mut window = started_timers(second.effects);
    assert_eq!(window.len(), 1);

    fire(&app, &mut model, &mut window[0]);

    assert_eq!(model.emergency.phase(), ActivationPhase::Idle);
    assert_eq!(model.emergency.press_count(), 0);
}

#[test]
fn test_press_after_pause_starts_over() {
    let (app, mut model) = on_help_page();

    let first = app.update(Event::EmergencyPressed, &mut model);
    let mut stale = started_timers(first.effects);
    let second = app.update(Event::EmergencyPressed, &mut model);
    let mut window = started_timers(second.effects);

    // The replaced timer fires anyway; nothing changes.
    fire(&app, &mut model, &mut stale[0]);
    assert_eq!(model.emergency.press_count(), 2);

    // 2.5 s pass: the live window closes.
    fire(&app, &mut model, &mut window[0]);
    app.update(Event::EmergencyPressed, &mut model);

    assert_eq!(model.emergency.phase(), ActivationPhase::Counting { presses: 1 });
    assert!(!model.emergency.is_armed());
}

#[test]
fn test_countdown_dispatches_to_contacts_exactly_once() {
    let (app, mut model) = on_help_page();

    app.update(Event::EmergencyPressed, &mut model);
    app.update(Event::EmergencyPressed, &mut model);
    let armed = app.update(Event::EmergencyPressed, &mut model);
    let mut ticks = started_timers(armed.effects);
    assert_eq!(ticks.len(), 1);

    let mut seen = vec![model.emergency.countdown().unwrap()];
    let mut navigations = 0;

    for _ in 0..5 {
        let mut tick = ticks.pop().expect("a live tick");
        let effects = fire(&app, &mut model, &mut tick);
        seen.push(model.emergency.countdown().unwrap_or(0));
        navigations += navigations_to(&effects, Route::EmergencyContacts);
        ticks = started_timers(effects);
    }

    assert_eq!(seen, vec![5, 4, 3, 2, 1, 0]);
    assert!(ticks.is_empty());
    assert_eq!(navigations, 1);
    assert_eq!(model.route, Route::EmergencyContacts);
}

#[test]
fn test_presses_while_armed_change_nothing() {
    let (app, mut model) = on_help_page();
    for _ in 0..3 {
        app.update(Event::EmergencyPressed, &mut model);
    }

    for _ in 0..4 {
        let update = app.update(Event::EmergencyPressed, &mut model);
        assert_eq!(vibrations(&update.effects), 0);
        assert!(started_timers(update.effects).is_empty());
        assert_eq!(model.emergency.countdown(), Some(5));
    }
}

#[test]
fn test_cancel_stops_the_countdown() {
    let (app, mut model) = on_help_page();
    app.update(Event::EmergencyPressed, &mut model);
    app.update(Event::EmergencyPressed, &mut model);
    let armed = app.update(Event::EmergencyPressed, &mut model);
    let mut ticks = started_timers(armed.effects);

    let cancelled = app.update(Event::CancelEmergency, &mut model);
    assert_eq!(cancelled_timers(&cancelled.effects), 1);
    assert_eq!(model.emergency.phase(), ActivationPhase::Idle);

    // A tick that races the cancellation is ignored.
    let effects = fire(&app, &mut model, &mut ticks[0]);
    assert_eq!(model.emergency.phase(), ActivationPhase::Idle);
    assert_eq!(navigations_to(&effects, Route::EmergencyContacts), 0);
    assert_eq!(model.route, Route::EmergencyHelp);
}
