//! Scripted device client for unit tests

use crate::http_client::{DeviceClient, FormBody, Method, Payload, ResponseFormat};
use anyhow::{Result, anyhow};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

#[derive(Clone, Debug)]
enum Scripted {
    Json(Value),
    Text(String),
    Fail,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Call {
    pub endpoint: String,
    pub method: Method,
    pub body: Option<FormBody>,
}

/// Answers requests from per-endpoint queues and records every call.
///
/// The last queued response for an endpoint is repeated once the queue is
/// down to one entry. Endpoints can be held so requests stay in flight until
/// released.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<Call>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, endpoint: &str, response: Scripted) {
        self.responses
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn respond_json(&self, endpoint: &str, value: Value) {
        self.push(endpoint, Scripted::Json(value));
    }

    pub fn respond_text(&self, endpoint: &str, text: &str) {
        self.push(endpoint, Scripted::Text(text.to_string()));
    }

    pub fn fail(&self, endpoint: &str) {
        self.push(endpoint, Scripted::Fail);
    }

    /// Keep requests to `endpoint` in flight until [`Self::release`]
    pub fn hold(&self, endpoint: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), Arc::new(Semaphore::new(0)));
    }

    /// Let one held request to `endpoint` complete
    pub fn release(&self, endpoint: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(endpoint) {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .count()
    }

    pub fn bodies_to(&self, endpoint: &str) -> Vec<FormBody> {
        self.calls()
            .into_iter()
            .filter(|call| call.endpoint == endpoint)
            .filter_map(|call| call.body)
            .collect()
    }

    fn next_response(&self, endpoint: &str) -> Option<Scripted> {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(endpoint)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl DeviceClient for ScriptedClient {
    async fn fetch(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<FormBody>,
        format: ResponseFormat,
    ) -> Result<Payload> {
        self.calls.lock().unwrap().push(Call {
            endpoint: endpoint.to_string(),
            method,
            body,
        });

        let gate = self.gates.lock().unwrap().get(endpoint).cloned();
        if let Some(gate) = gate {
            gate.acquire().await?.forget();
        }

        match self.next_response(endpoint) {
            Some(Scripted::Json(value)) => match format {
                ResponseFormat::Json => Ok(Payload::Json(value)),
                ResponseFormat::Text => Ok(Payload::Text(value.to_string())),
            },
            Some(Scripted::Text(text)) => Payload::parse(text, format),
            Some(Scripted::Fail) => Err(anyhow!("{method} {endpoint} failed with status 500")),
            None => Err(anyhow!("no scripted response for {method} {endpoint}")),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("http://device{path}")
    }
}
