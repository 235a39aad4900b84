use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::app::wizard::WizardEvent;
use crate::core::app::AppState;

pub(super) fn handle_persona_create_action(
    app: &mut App,
    action: AppAction,
    _ctx: AppActionContext,
) -> Option<AppCommand> {
    let AppState::PersonaCreate(wizard) = &mut app.state else {
        return None;
    };

    match action {
        AppAction::TextInput(input) => {
            wizard.handle_input(input);
            None
        }
        AppAction::Paste { text } => {
            wizard.paste(&text);
            None
        }
        AppAction::SubmitInput => match wizard.submit(&mut app.session.store) {
            WizardEvent::Continue => None,
            WizardEvent::VerifyEndpoint { url } => {
                let check_id = app.session.next_check_id();
                wizard.begin_check(check_id);
                Some(AppCommand::VerifyEndpoint { url, check_id })
            }
            WizardEvent::Created {
                persona,
                make_default,
            } => {
                let name = persona.name.clone();
                app.session.active_persona = Some(persona);
                app.enter_main();
                app.session.set_status(if make_default {
                    format!("Created persona '{name}' and made it the default")
                } else {
                    format!("Created persona '{name}'")
                });
                None
            }
        },
        AppAction::EndpointChecked { check_id, result } => {
            wizard.endpoint_checked(check_id, result);
            None
        }
        _ => None,
    }
}
