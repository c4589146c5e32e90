use crate::resources::{
    Config, ConfigResource, LastValues, LastValuesResource, Logs, LogsResource, Status,
    StatusResource, Storage, StorageResource,
};
use crate::state::StateContainer;
use crate::types::ActionState;

/// Application Model - every piece of observable state
///
/// The rendering layer subscribes to the containers it displays and writes
/// form edits through `config`.
pub struct Model {
    // Device resources
    pub config: ConfigResource,
    pub status: StatusResource,
    pub last: LastValuesResource,
    pub logs: LogsResource,
    pub storage: StorageResource,

    // Save actions
    pub network: StateContainer<ActionState>,
    pub admin: StateContainer<ActionState>,
    pub calibration: StateContainer<ActionState>,
    pub emoncms: StateContainer<ActionState>,
    pub mqtt: StateContainer<ActionState>,

    // UI state
    /// Set once config, status and last values were loaded
    pub initialised: StateContainer<bool>,
    /// Set after the network credentials were accepted, until the device
    /// reports it joined as a client
    pub wifi_connecting: StateContainer<bool>,
    pub notice: StateContainer<Option<String>>,
}

impl Model {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            config: Config::resource(),
            status: Status::resource(),
            last: LastValues::resource(),
            logs: Logs::resource(log_capacity),
            storage: Storage::resource(),
            network: StateContainer::default(),
            admin: StateContainer::default(),
            calibration: StateContainer::default(),
            emoncms: StateContainer::default(),
            mqtt: StateContainer::default(),
            initialised: StateContainer::new(false),
            wifi_connecting: StateContainer::new(false),
            notice: StateContainer::new(None),
        }
    }

    /// Set the user-facing message
    pub fn set_notice(&self, notice: impl Into<String>) {
        self.notice.set(Some(notice.into()));
    }

    pub fn clear_notice(&self) {
        self.notice.set(None);
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(crate::resources::logs::DEFAULT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uninitialised_with_idle_actions() {
        let model = Model::default();

        assert!(!model.initialised.get());
        assert!(!model.wifi_connecting.get());
        assert_eq!(model.network.get(), ActionState::default());
        assert_eq!(model.status.mode(), "ERR");
    }

    #[test]
    fn notice_can_be_set_and_cleared() {
        let model = Model::default();

        model.set_notice("Failed to save MQTT config");
        assert_eq!(
            model.notice.get().as_deref(),
            Some("Failed to save MQTT config")
        );

        model.clear_notice();
        assert_eq!(model.notice.get(), None);
    }
}
