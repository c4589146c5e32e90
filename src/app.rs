//! Application controller
//!
//! [`App`] owns the [`Model`], sequences the initial load, drives the two
//! recurring polls and exposes the user actions.

use crate::clock::device_time;
use crate::config::AppConfig;
use crate::http_client::{DeviceClient, Method, ResponseFormat};
use crate::model::Model;
use crate::resources::Storage;
use crate::schedule::PollTask;
use crate::state::StateContainer;
use crate::types::{
    ActionState, AdminForm, CalibrationForm, EmoncmsForm, FileEntry, MqttForm, NetworkForm,
    SaveForm,
};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::Arc;
use time::OffsetDateTime;

pub struct App<C> {
    client: Arc<C>,
    model: Arc<Model>,
    status_poll: Arc<PollTask>,
    log_poll: Arc<PollTask>,
}

impl<C> App<C>
where
    C: DeviceClient + Send + Sync + 'static,
{
    pub fn new(client: Arc<C>, config: &AppConfig) -> Self {
        let model = Arc::new(Model::new(config.log_capacity));

        let status_poll = PollTask::new("status", config.polling.status_interval, {
            let (client, model) = (Arc::clone(&client), Arc::clone(&model));
            move || status_cycle(Arc::clone(&client), Arc::clone(&model))
        });

        let log_poll = PollTask::new("logs", config.polling.log_interval, {
            let (client, model) = (Arc::clone(&client), Arc::clone(&model));
            move || log_cycle(Arc::clone(&client), Arc::clone(&model))
        });

        Self {
            client,
            model,
            status_poll,
            log_poll,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Initial load followed by the start of both recurring polls.
    ///
    /// Config, status and last values are loaded one after the other while
    /// holding the status poll's guard, so status polls triggered meanwhile
    /// are skipped. The storage listing is fetched in the background once the
    /// model is initialised.
    pub async fn start(&self) {
        info!("loading device state");

        self.status_poll
            .run_exclusive(async {
                self.model.config.update(self.client.as_ref()).await;
                update_status(self.client.as_ref(), &self.model).await;
                self.model.last.update(self.client.as_ref()).await;
                self.model.initialised.set(true);
            })
            .await;

        let (client, model) = (Arc::clone(&self.client), Arc::clone(&self.model));
        tokio::spawn(async move {
            model.storage.update(client.as_ref()).await;
        });

        self.status_poll.start();
        self.log_poll.start();
    }

    /// Cancel both recurring polls; in-flight requests still complete
    pub fn stop(&self) {
        self.status_poll.stop();
        self.log_poll.stop();
    }

    /// Run a status cycle now; `false` if one is already in flight
    pub async fn poll_status(&self) -> bool {
        self.status_poll.poll().await
    }

    /// Run a log cycle now; `false` if one is already in flight
    pub async fn poll_logs(&self) -> bool {
        self.log_poll.poll().await
    }

    pub async fn save_network(&self) -> Result<()> {
        self.save::<NetworkForm>(&self.model.network).await?;
        self.model.wifi_connecting.set(true);
        Ok(())
    }

    pub async fn save_admin(&self) -> Result<()> {
        self.save::<AdminForm>(&self.model.admin).await
    }

    pub async fn save_calibration(&self) -> Result<()> {
        self.save::<CalibrationForm>(&self.model.calibration).await
    }

    pub async fn save_emoncms(&self) -> Result<()> {
        self.save::<EmoncmsForm>(&self.model.emoncms).await
    }

    pub async fn save_mqtt(&self) -> Result<()> {
        self.save::<MqttForm>(&self.model.mqtt).await
    }

    /// Validate the form locally, then post it.
    ///
    /// A validation failure sends nothing and leaves `flags` alone.
    async fn save<F: SaveForm>(&self, flags: &StateContainer<ActionState>) -> Result<()> {
        let form = F::from_config(self.model.config.state());
        if let Err(e) = form.check() {
            debug!("{} rejected: {e}", F::ACTION);
            self.model.set_notice(e.to_string());
            return Err(e);
        }
        let body = form.body()?;

        info!("{}", F::ACTION);
        flags.set(ActionState::started());

        let result = self
            .client
            .fetch(F::ENDPOINT, Method::Post, Some(body), ResponseFormat::Text)
            .await;

        flags.set(ActionState::settled(result.is_ok()));
        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("{} failed: {e:#}", F::ACTION);
                self.model.set_notice(F::FAILURE_NOTICE);
                Err(e)
            }
        }
    }

    /// Switch off the device's access point.
    ///
    /// Returns the address the device stays reachable on, when known.
    pub async fn ap_off(&self) -> Result<Option<String>> {
        self.command("/apoff", "turn off access point").await?;
        Ok(self
            .model
            .status
            .ip_address()
            .map(|ip| format!("http://{ip}")))
    }

    /// Reset all device settings and reboot
    pub async fn factory_reset(&self) -> Result<()> {
        self.command("/reset", "factory reset").await
    }

    pub async fn restart(&self) -> Result<()> {
        self.command("/restart", "restart").await
    }

    async fn command(&self, endpoint: &str, action: &str) -> Result<()> {
        info!("{action}");
        match self
            .client
            .fetch(endpoint, Method::Post, None, ResponseFormat::Text)
            .await
        {
            Ok(payload) => {
                debug!("{action}: {}", payload.into_text().unwrap_or_default());
                Ok(())
            }
            Err(e) => {
                warn!("{action} failed: {e:#}");
                self.model.set_notice(format!("Failed to {action}"));
                Err(e)
            }
        }
    }

    /// Show `dir` in the storage listing and fetch it
    pub async fn change_directory(&self, dir: &str) -> bool {
        self.model.storage.set_dir(dir);
        self.model.storage.update(self.client.as_ref()).await
    }

    /// Delete a file from the SD card and refresh the listing
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let endpoint = format!(
            "{}/{}",
            Storage::ENDPOINT_PREFIX,
            path.trim_start_matches('/')
        );
        info!("delete {endpoint}");

        if let Err(e) = self
            .client
            .fetch(&endpoint, Method::Delete, None, ResponseFormat::Text)
            .await
        {
            warn!("delete {endpoint} failed: {e:#}");
            self.model.set_notice("Failed to delete file");
            return Err(e);
        }

        self.model.storage.update(self.client.as_ref()).await;
        Ok(())
    }

    /// Absolute download URL of a listing entry
    pub fn file_url(&self, entry: &FileEntry) -> String {
        let path = entry.url.clone().unwrap_or_else(|| {
            let dir = self.model.storage.dir();
            format!(
                "{}{}/{}",
                Storage::ENDPOINT_PREFIX,
                dir.trim_end_matches('/'),
                entry.name
            )
        });
        self.client.url_for(&path)
    }

    pub fn clear_notice(&self) {
        self.model.clear_notice();
    }
}

impl<C> Drop for App<C> {
    fn drop(&mut self) {
        self.status_poll.stop();
        self.log_poll.stop();
    }
}

async fn status_cycle<C>(client: Arc<C>, model: Arc<Model>)
where
    C: DeviceClient + Send + Sync + 'static,
{
    update_status(client.as_ref(), &model).await;

    if model.status.clock_unset() {
        match device_time(OffsetDateTime::now_utc()) {
            Ok(time) => {
                let client = Arc::clone(&client);
                tokio::spawn(async move {
                    if let Err(e) = set_time(client.as_ref(), time).await {
                        warn!("{e:#}");
                    }
                });
            }
            Err(e) => warn!("{e:#}"),
        }
    }

    model.last.update(client.as_ref()).await;
}

async fn log_cycle<C>(client: Arc<C>, model: Arc<Model>)
where
    C: DeviceClient + Send + Sync + 'static,
{
    model.logs.update(client.as_ref()).await;
}

/// Update status and finish a pending WiFi connection once the device
/// reports a client mode
async fn update_status<C: DeviceClient + Sync>(client: &C, model: &Model) {
    if model.status.update(client).await && model.status.is_wifi_client() {
        model.wifi_connecting.set(false);
    }
}

async fn set_time<C: DeviceClient + Sync>(client: &C, time: String) -> Result<()> {
    debug!("setting device clock to {time}");
    client
        .fetch(
            "/settime",
            Method::Post,
            Some(vec![("time".to_string(), time)]),
            ResponseFormat::Text,
        )
        .await
        .context("failed to set device clock")?;
    Ok(())
}
