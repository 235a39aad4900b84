use super::{App, AppAction, AppActionContext, AppCommand};

pub(super) fn handle_main_action(
    app: &mut App,
    action: AppAction,
    _ctx: AppActionContext,
) -> Option<AppCommand> {
    match action {
        AppAction::OpenChat => {
            app.session.clear_status();
            app.enter_chat();
        }
        AppAction::OpenPersonaList => {
            app.session.clear_status();
            app.enter_persona_list();
        }
        AppAction::OpenPersonaCreate => {
            app.session.clear_status();
            app.enter_persona_create();
        }
        AppAction::Quit => app.session.exit_requested = true,
        _ => {}
    }
    None
}
