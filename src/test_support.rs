//! Test support utilities shared across unit and integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::hcloud::HcloudApiError;
use crate::outputs::{CiOutput, OutputError};
use crate::provider::{Provider, ProviderFuture, Server, ServerSpec};

/// Records every CI output written during a test.
#[derive(Clone, Debug, Default)]
pub struct RecordingOutput {
    state: Arc<Mutex<RecordedOutputs>>,
}

#[derive(Debug, Default)]
struct RecordedOutputs {
    outputs: Vec<(String, String)>,
    variables: Vec<(String, String)>,
}

impl RecordingOutput {
    /// Creates a new recorder with nothing written.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RecordedOutputs> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns all step outputs recorded so far, in write order.
    #[must_use]
    pub fn outputs(&self) -> Vec<(String, String)> {
        self.lock().outputs.clone()
    }

    /// Returns all exported variables recorded so far, in write order.
    #[must_use]
    pub fn variables(&self) -> Vec<(String, String)> {
        self.lock().variables.clone()
    }

    /// Returns the last exported value for `name`, if any.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<String> {
        self.lock()
            .variables
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }
}

impl CiOutput for RecordingOutput {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), OutputError> {
        self.lock().outputs.push((name.to_owned(), value.to_owned()));
        Ok(())
    }

    fn export_variable(&mut self, name: &str, value: &str) -> Result<(), OutputError> {
        self.lock()
            .variables
            .push((name.to_owned(), value.to_owned()));
        Ok(())
    }
}

/// Records a single call made through [`ScriptedProvider`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProviderCall {
    /// A create call, identified by the spec's server name.
    CreateServer {
        /// Name from the submitted spec.
        name: String,
    },
    /// A startup wait for the given server.
    WaitForStartup {
        /// Id of the server being waited on.
        server_id: i64,
    },
    /// A floating IP assignment attempt.
    AssignFloatingIp {
        /// Raw configured floating IP id, as passed through.
        floating_ip_id: Option<String>,
        /// Id of the target server.
        server_id: i64,
    },
    /// A delete call.
    DeleteServer {
        /// Id of the server being deleted.
        server_id: i64,
    },
}

/// Provider double that returns pre-seeded results in FIFO order and records
/// every call.
///
/// Unseeded create and delete calls fail with a transport error so a test
/// cannot silently succeed on a call it never scripted. Unseeded startup and
/// assignment calls resolve to their benign defaults (ready, skipped).
#[derive(Clone, Debug, Default)]
pub struct ScriptedProvider {
    state: Arc<Mutex<ScriptedState>>,
}

#[derive(Debug, Default)]
struct ScriptedState {
    create_results: VecDeque<Result<Server, HcloudApiError>>,
    startup_results: VecDeque<Result<(), HcloudApiError>>,
    assign_results: VecDeque<Result<Option<String>, HcloudApiError>>,
    delete_results: VecDeque<Result<(), HcloudApiError>>,
    calls: Vec<ProviderCall>,
}

impl ScriptedProvider {
    /// Creates a provider with no scripted results.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a result for the next create call.
    pub fn push_create(&self, result: Result<Server, HcloudApiError>) {
        self.lock().create_results.push_back(result);
    }

    /// Queues a result for the next startup wait.
    pub fn push_startup(&self, result: Result<(), HcloudApiError>) {
        self.lock().startup_results.push_back(result);
    }

    /// Queues a result for the next assignment call.
    pub fn push_assignment(&self, result: Result<Option<String>, HcloudApiError>) {
        self.lock().assign_results.push_back(result);
    }

    /// Queues a result for the next delete call.
    pub fn push_delete(&self, result: Result<(), HcloudApiError>) {
        self.lock().delete_results.push_back(result);
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.lock().calls.clone()
    }
}

fn missing_script(operation: &str) -> HcloudApiError {
    HcloudApiError::Transport {
        message: format!("no scripted {operation} response available"),
    }
}

impl Provider for ScriptedProvider {
    type Error = HcloudApiError;

    fn create_server<'a>(
        &'a self,
        spec: &'a ServerSpec,
    ) -> ProviderFuture<'a, Server, Self::Error> {
        let mut state = self.lock();
        state.calls.push(ProviderCall::CreateServer {
            name: spec.name.clone(),
        });
        let result = state
            .create_results
            .pop_front()
            .unwrap_or_else(|| Err(missing_script("create_server")));
        drop(state);
        Box::pin(async move { result })
    }

    fn wait_for_startup<'a>(
        &'a self,
        server: &'a Server,
    ) -> ProviderFuture<'a, (), Self::Error> {
        let mut state = self.lock();
        state.calls.push(ProviderCall::WaitForStartup {
            server_id: server.id,
        });
        let result = state.startup_results.pop_front().unwrap_or(Ok(()));
        drop(state);
        Box::pin(async move { result })
    }

    fn assign_floating_ip<'a>(
        &'a self,
        floating_ip_id: Option<&'a str>,
        server: &'a Server,
    ) -> ProviderFuture<'a, Option<String>, Self::Error> {
        let mut state = self.lock();
        state.calls.push(ProviderCall::AssignFloatingIp {
            floating_ip_id: floating_ip_id.map(str::to_owned),
            server_id: server.id,
        });
        let result = state.assign_results.pop_front().unwrap_or(Ok(None));
        drop(state);
        Box::pin(async move { result })
    }

    fn delete_server(&self, server_id: i64) -> ProviderFuture<'_, (), Self::Error> {
        let mut state = self.lock();
        state.calls.push(ProviderCall::DeleteServer { server_id });
        let result = state
            .delete_results
            .pop_front()
            .unwrap_or_else(|| Err(missing_script("delete_server")));
        drop(state);
        Box::pin(async move { result })
    }
}
