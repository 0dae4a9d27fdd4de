use tracing::{debug, info, warn};

use crate::capabilities::{
    decode_json, decode_json_optional, get_json, post_json, Capabilities, TimerOutput,
    INCIDENTS_PATH, LOGIN_PATH, REGISTER_PATH,
};
use crate::dashboard::DashboardCommand;
use crate::emergency::{ActivationCommand, EmergencyActivationFlow};
use crate::event::Event;
use crate::model::{IncidentListPayload, IncidentRecord, LoginPayload, Model, Route};
use crate::report::IncidentReportFlow;
use crate::view::ViewModel;
use crate::{AppError, ValidatedCoordinate, DASHBOARD_CENTER, DASHBOARD_ZOOM, FLY_TO_DURATION_MS};

#[derive(Default)]
pub struct App;

impl App {
    fn navigate(model: &mut Model, route: Route, caps: &Capabilities) {
        if model.route == route {
            return;
        }

        Self::leave_page(model, caps);
        info!(from = ?model.route, to = ?route, "navigate");
        model.route = route;
        Self::enter_page(model, caps);

        caps.navigator.go_to(route);
    }

    fn leave_page(model: &mut Model, caps: &Capabilities) {
        match model.route {
            Route::EmergencyHelp => {
                let commands = model.emergency.teardown();
                Self::run_activation(model, commands, caps);
            }
            Route::Dashboard => {
                let commands = model.dashboard.leave();
                Self::run_dashboard(model, commands, caps);
            }
            Route::Home | Route::Report | Route::EmergencyContacts => {}
        }
    }

    fn enter_page(model: &mut Model, caps: &Capabilities) {
        match model.route {
            Route::EmergencyHelp => {
                model.emergency = EmergencyActivationFlow::new(model.config.activation.clone());
            }
            Route::Report => {
                model.report = IncidentReportFlow::new();
            }
            Route::Dashboard => {
                caps.map.set_view(DASHBOARD_CENTER, DASHBOARD_ZOOM);
                let commands = model.dashboard.enter();
                Self::run_dashboard(model, commands, caps);
            }
            Route::Home | Route::EmergencyContacts => {}
        }
    }

    fn run_activation(model: &mut Model, commands: Vec<ActivationCommand>, caps: &Capabilities) {
        for command in commands {
            match command {
                ActivationCommand::ScheduleReset { id, millis } => {
                    let timer = id.clone();
                    caps.timer.start(id, millis, move |output| Event::PressWindowElapsed {
                        timer,
                        output,
                    });
                }
                ActivationCommand::ScheduleTick { id, millis } => {
                    let timer = id.clone();
                    caps.timer.start(id, millis, move |output| Event::CountdownTick {
                        timer,
                        output,
                    });
                }
                ActivationCommand::CancelTimer(id) => caps.timer.cancel(id),
                ActivationCommand::Vibrate { millis } => {
                    info!(millis, "emergency armed");
                    caps.haptics.vibrate(millis);
                }
                ActivationCommand::Dispatch(route) => {
                    warn!(?route, "emergency dispatched");
                    Self::navigate(model, route, caps);
                }
            }
        }
    }

    fn run_dashboard(model: &Model, commands: Vec<DashboardCommand>, caps: &Capabilities) {
        for command in commands {
            match command {
                DashboardCommand::Fetch => Self::send_list_request(model, caps),
                DashboardCommand::SchedulePoll { id, millis } => {
                    let timer = id.clone();
                    caps.timer.start(id, millis, move |output| Event::DashboardPoll {
                        timer,
                        output,
                    });
                }
                DashboardCommand::CancelTimer(id) => caps.timer.cancel(id),
            }
        }
    }

    fn send_list_request(model: &Model, caps: &Capabilities) {
        let url = model.config.endpoint(INCIDENTS_PATH);
        debug!(%url, "fetching incidents");
        get_json(&caps.http, &url, |result| {
            Event::IncidentsLoaded(
                decode_json::<IncidentListPayload>(result).map(IncidentListPayload::into_records),
            )
        });
    }

    fn send_report(model: &mut Model, caps: &Capabilities) {
        let submission = match model.report.submit() {
            Ok(submission) => submission,
            Err(e) => {
                debug!(error = %e, "report not submitted");
                return;
            }
        };

        let Some(key) = model.report.pending_key().cloned() else {
            return;
        };
        let url = model.config.endpoint(INCIDENTS_PATH);
        info!(category = %submission.category, idempotency_key = %key, "submitting incident");

        let response_key = key.clone();
        let sent = post_json(&caps.http, &url, &submission, Some(&key), move |result| {
            Event::IncidentSubmitted {
                key: response_key,
                result: decode_json_optional::<IncidentRecord>(result),
            }
        });
        if let Err(e) = sent {
            warn!(error = %e, "incident request not sent");
            model.report.submission_failed(&key, &e);
        }
    }

    fn send_registration(model: &mut Model, caps: &Capabilities) {
        let profile = match model.registration.submit() {
            Ok(profile) => profile,
            Err(e) => {
                debug!(error = %e, "registration not submitted");
                return;
            }
        };

        let url = model.config.endpoint(REGISTER_PATH);
        info!(contacts = profile.emergency_contacts.len(), "submitting registration");

        let sent = post_json(&caps.http, &url, &profile, None, |result| {
            Event::Registered(decode_json_optional::<serde_json::Value>(result).map(|_| ()))
        });
        if let Err(e) = sent {
            warn!(error = %e, "registration request not sent");
            model.registration.failed(&e);
        }
    }

    fn send_login(model: &mut Model, caps: &Capabilities) {
        let credentials = match model.login.submit() {
            Ok(credentials) => credentials,
            Err(e) => {
                debug!(error = %e, "login not submitted");
                return;
            }
        };

        let url = model.config.endpoint(LOGIN_PATH);
        let sent = post_json(&caps.http, &url, &credentials, None, |result| {
            Event::LoggedIn(decode_json::<LoginPayload>(result).map(LoginPayload::into_account))
        });
        if let Err(e) = sent {
            warn!(error = %e, "login request not sent");
            model.login.failed(&e);
        }
    }

    fn show_incident_layer(model: &Model, caps: &Capabilities) {
        match serde_json::to_string(&model.dashboard.incident_layer()) {
            Ok(geojson) => caps.map.show_incidents(geojson),
            Err(e) => warn!(error = %e, "incident layer not serialized"),
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        debug!(event = event_name, "update");

        if event.is_user_initiated() && !event.is_sensitive() {
            info!(event = event_name, route = ?model.route, "user action");
        }

        match event {
            Event::Noop => return,

            Event::Configure(config) => match config.validate() {
                Ok(()) => {
                    info!(api_base_url = %config.api_base_url, "configured");
                    model.dashboard.set_poll_interval(config.dashboard_poll_ms);
                    model.config = config;
                }
                Err(e) => {
                    warn!(error = %e, "configuration rejected");
                    model.set_error(e.into());
                }
            },

            Event::Navigate(route) => Self::navigate(model, route, caps),

            Event::DismissError => {
                model.clear_error();
                model.report.dismiss_error();
            }

            Event::CategorySelected(category) => model.report.set_category(category),

            Event::CustomCategoryChanged(text) => model.report.set_custom_category(text),

            Event::DescriptionChanged(text) => model.report.set_description(text),

            Event::MapClicked { lat, lng } => match ValidatedCoordinate::new(lat, lng) {
                Ok(coordinate) => {
                    let fly = model.report.select_location(coordinate);
                    caps.map.fly_to(fly.target, FLY_TO_DURATION_MS);
                }
                Err(e) => {
                    warn!(error = %e, lat, lng, "map click ignored");
                    model.set_error(AppError::from(e));
                }
            },

            Event::SubmitReport => Self::send_report(model, caps),

            Event::IncidentSubmitted {
                key,
                result: Ok(record),
            } => {
                let id = record.as_ref().and_then(|r| r.id);
                if model.report.submission_succeeded(&key, record) {
                    info!(?id, "incident reported");
                } else {
                    debug!(idempotency_key = %key, ?id, "stale incident response dropped");
                }
            }

            Event::IncidentSubmitted {
                key,
                result: Err(e),
            } => {
                if model.report.submission_failed(&key, &e) {
                    warn!(error = %e, "incident report failed");
                } else {
                    debug!(idempotency_key = %key, error = %e, "stale incident response dropped");
                }
            }

            Event::ReportAnother => model.report.reset_to_editing(),

            Event::EmergencyPressed => {
                let commands = model.emergency.activate();
                Self::run_activation(model, commands, caps);
            }

            Event::CancelEmergency => {
                let commands = model.emergency.cancel();
                Self::run_activation(model, commands, caps);
            }

            Event::PressWindowElapsed { timer, output } => {
                if output == TimerOutput::Fired {
                    model.emergency.on_reset_elapsed(&timer);
                }
            }

            Event::CountdownTick { timer, output } => {
                if output == TimerOutput::Fired {
                    let commands = model.emergency.on_tick(&timer);
                    Self::run_activation(model, commands, caps);
                }
            }

            Event::RefreshDashboard => {
                let commands = model.dashboard.refresh();
                Self::run_dashboard(model, commands, caps);
            }

            Event::DashboardPoll { timer, output } => {
                if output == TimerOutput::Fired {
                    let commands = model.dashboard.on_poll(&timer);
                    Self::run_dashboard(model, commands, caps);
                }
            }

            Event::IncidentsLoaded(result) => {
                let loaded = result.is_ok();
                model.dashboard.loaded(result);
                if loaded && model.route == Route::Dashboard {
                    Self::show_incident_layer(model, caps);
                }
            }

            Event::RegistrationNameChanged(name) => model.registration.name = name,

            Event::RegistrationPhoneChanged(phone) => model.registration.phone = phone,

            Event::RegistrationPasswordChanged(password) => {
                model.registration.password = password;
            }

            Event::RegistrationEmailChanged(email) => model.registration.email = email,

            Event::AddContact => model.registration.add_contact(),

            Event::RemoveContact(index) => {
                if !model.registration.remove_contact(index) {
                    debug!(index, "contact row kept");
                }
            }

            Event::ContactChanged {
                index,
                field,
                value,
            } => model.registration.update_contact(index, field, value),

            Event::SubmitRegistration => Self::send_registration(model, caps),

            Event::Registered(Ok(())) => {
                info!("registration succeeded");
                model.registration.succeeded();
            }

            Event::Registered(Err(e)) => {
                warn!(error = %e, "registration failed");
                model.registration.failed(&e);
            }

            Event::LoginPhoneChanged(phone) => model.login.phone = phone,

            Event::LoginPasswordChanged(password) => model.login.password = password,

            Event::SubmitLogin => Self::send_login(model, caps),

            Event::LoggedIn(Ok(account)) => {
                info!(account_id = ?account.id, "signed in");
                model.login.succeeded(&account);
                model.account = Some(account);
            }

            Event::LoggedIn(Err(e)) => {
                warn!(error = %e, "login failed");
                model.login.failed(&e);
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from_model(model)
    }
}
