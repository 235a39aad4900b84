use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::app::AppState;

pub(super) fn handle_persona_list_action(
    app: &mut App,
    action: AppAction,
    _ctx: AppActionContext,
) -> Option<AppCommand> {
    let AppState::PersonaList(picker) = &mut app.state else {
        return None;
    };

    match action {
        AppAction::PickerMoveUp => picker.move_up(),
        AppAction::PickerMoveDown => picker.move_down(),
        AppAction::PickerApplySelection => {
            let Some(name) = picker.selected_id().map(str::to_string) else {
                return None;
            };
            match app.session.store.find(&name) {
                Some(persona) => {
                    app.session.active_persona = Some(persona);
                    app.session.set_status(format!("Active persona: {name}"));
                }
                None => app
                    .session
                    .set_status(format!("Persona '{name}' is no longer in the config")),
            }
            app.enter_main();
        }
        _ => {}
    }
    None
}
