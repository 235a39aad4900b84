//! Background work started by [`AppCommand`](crate::core::app::AppCommand)s.

use std::sync::Arc;

use tracing::debug;

use crate::core::app::{AppAction, AppActionContext, AppActionDispatcher};
use crate::core::client::ApiConnector;

/// List models at `url` and report back as an `EndpointChecked` action.
pub fn spawn_endpoint_check(
    connector: Arc<dyn ApiConnector>,
    dispatcher: AppActionDispatcher,
    url: String,
    check_id: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let api = connector.connect(&url, None);
        let result = api.list_models().await.map_err(|err| err.to_string());
        debug!(%url, check_id, ok = result.is_ok(), "endpoint check finished");
        dispatcher.dispatch(
            AppAction::EndpointChecked { check_id, result },
            AppActionContext::default(),
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::AppActionEnvelope;
    use crate::utils::test_utils::{FakeApi, FakeConnector};
    use tokio::sync::mpsc;

    async fn check_with(connector: FakeConnector) -> (u64, Result<Vec<String>, String>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<AppActionEnvelope>();
        spawn_endpoint_check(
            Arc::new(connector),
            AppActionDispatcher::new(tx),
            "http://localhost:11434/api".into(),
            9,
        )
        .await
        .unwrap();

        match rx.recv().await.map(|envelope| envelope.action) {
            Some(AppAction::EndpointChecked { check_id, result }) => (check_id, result),
            _ => panic!("expected an endpoint check result"),
        }
    }

    #[tokio::test]
    async fn reports_listed_models() {
        let (check_id, result) = check_with(FakeConnector::new(FakeApi::with_models(&["m1"]))).await;
        assert_eq!(check_id, 9);
        assert_eq!(result, Ok(vec!["m1".to_string()]));
    }

    #[tokio::test]
    async fn reports_failures_as_text() {
        let (_, result) = check_with(FakeConnector::new(FakeApi::unreachable("refused"))).await;
        assert!(result.unwrap_err().contains("refused"));
    }
}
