use std::{
    io::prelude::*,
    path::Path,
    sync::{Arc, Mutex},
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::*;

use crate::{cli, telemetry::MetricKind};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HeaderSettingsFile {
    pub name: String,
    pub version: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServerSettings {
    pub address: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud: u32,
}

/// Alert thresholds use 0 as "disabled", matching the display firmware.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CpuStatsSettings {
    pub enabled: bool,
    /// Load alert threshold in percent
    pub load: u64,
    /// Temperature alert threshold in degrees Celsius
    pub temp: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct MemoryStatsSettings {
    pub enabled: bool,
    /// Load alert threshold in percent
    pub load: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct GpuStatsSettings {
    pub enabled: bool,
    /// Load alert threshold in percent
    pub load: u64,
    /// Used memory alert threshold in MB
    pub mem: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct NetworkStatsSettings {
    pub enabled: bool,
    /// Download alert threshold in KB/s
    pub download: u64,
    /// Upload alert threshold in KB/s
    pub upload: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct StatsSettings {
    /// Sampling interval in seconds
    pub interval: u64,
    pub cpu: CpuStatsSettings,
    pub memory: MemoryStatsSettings,
    pub gpu: GpuStatsSettings,
    pub network: NetworkStatsSettings,
}

impl StatsSettings {
    pub fn enabled(&self, kind: MetricKind) -> bool {
        match kind {
            MetricKind::Cpu => self.cpu.enabled,
            MetricKind::Memory => self.memory.enabled,
            MetricKind::Gpu => self.gpu.enabled,
            MetricKind::Network => self.network.enabled,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SleepSettings {
    /// Daily quiet-hours start as "HH:MM"; equal start and end disable quiet hours
    pub start: String,
    /// Daily quiet-hours end as "HH:MM"
    pub end: String,
    pub normal_brightness: u8,
    pub sleep_brightness: u8,
}

/// The device section of the settings, replaced wholesale on every
/// configuration update while the pipeline is down.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TelemetrySettings {
    pub serial: SerialSettings,
    pub stats: StatsSettings,
    pub sleep: SleepSettings,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SettingsStruct {
    pub header: HeaderSettingsFile,
    pub server: ServerSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Debug)]
struct ManagerStruct {
    pub file_name: String,
    pub config: SettingsStruct,
}

struct Manager {
    pub content: Option<ManagerStruct>,
}

lazy_static! {
    static ref MANAGER: Arc<Mutex<Manager>> = Arc::new(Mutex::new(Manager { content: None }));
}

impl Default for SettingsStruct {
    fn default() -> Self {
        SettingsStruct {
            header: HeaderSettingsFile {
                name: "Telemetry Display Manager".to_string(),
                version: 0,
            },
            server: ServerSettings {
                address: "0.0.0.0:12345".to_string(),
            },
            telemetry: TelemetrySettings {
                serial: SerialSettings {
                    port: "".to_string(),
                    baud: 9600,
                },
                stats: StatsSettings {
                    interval: 1,
                    cpu: CpuStatsSettings {
                        enabled: false,
                        load: 0,
                        temp: 0,
                    },
                    memory: MemoryStatsSettings {
                        enabled: false,
                        load: 0,
                    },
                    gpu: GpuStatsSettings {
                        enabled: false,
                        load: 0,
                        mem: 0,
                    },
                    network: NetworkStatsSettings {
                        enabled: false,
                        download: 0,
                        upload: 0,
                    },
                },
                sleep: SleepSettings {
                    start: "00:00".to_string(),
                    end: "00:00".to_string(),
                    normal_brightness: 80,
                    sleep_brightness: 10,
                },
            },
        }
    }
}

impl Manager {
    fn new(file_name: &str) -> ManagerStruct {
        let file_name = if !Path::new(file_name).is_absolute() {
            match ProjectDirs::from("com", "Telemetry Display Manager", env!("CARGO_PKG_NAME")) {
                Some(project) => {
                    let folder_path = Path::new(project.config_dir());
                    if let Err(error) = std::fs::create_dir_all(folder_path) {
                        error!(
                            "Failed to create settings folder: {}, reason: {:#?}",
                            folder_path.to_str().unwrap(),
                            error
                        );
                    }
                    Path::new(&folder_path)
                        .join(file_name)
                        .to_str()
                        .expect("Failed to create settings path.")
                        .to_string()
                }
                None => panic!("Failed to find user settings path."),
            }
        } else {
            file_name.into()
        };

        debug!("Using settings file: {}", &file_name);

        let settings = ManagerStruct {
            file_name: file_name.to_string(),
            config: load_settings_from_file(&file_name),
        };

        save_settings_to_file(&settings.file_name, &settings.config).unwrap_or_else(|error| {
            error!("Failed to save file: {:#?}", error);
        });

        settings
    }
}

// Init settings manager with the desired settings file,
// will be created if does not exist
pub fn init(file_name: Option<&str>) {
    let mut manager = MANAGER.as_ref().lock().unwrap();
    let file_name = file_name.unwrap_or("settings.json");
    manager.content = Some(Manager::new(file_name));
}

fn load_settings_from_file(file_name: &str) -> SettingsStruct {
    let result = std::fs::read_to_string(file_name);

    if result.is_err() || cli::manager::is_reset() {
        return SettingsStruct::default();
    };

    serde_json::from_str(result.unwrap().as_str()).unwrap_or_else(|error| {
        warn!("Failed to parse settings file, using defaults: {error:#?}");
        SettingsStruct::default()
    })
}

fn save_settings_to_file(file_name: &str, content: &SettingsStruct) -> std::io::Result<()> {
    let mut file = std::fs::File::create(file_name)?;
    debug!("content: {:#?}", content);
    let value = serde_json::to_string_pretty(content).unwrap();
    file.write_all(value.as_bytes())
}

// Save the latest state of the settings
pub fn save() {
    let manager = MANAGER.as_ref().lock().unwrap();
    if let Some(content) = &manager.content {
        if let Err(error) = save_settings_to_file(&content.file_name, &content.config) {
            error!(
                "Failed to save settings: file: {:#?}, configuration: {:#?}, error: {:#?}",
                &content.file_name, &content.config, error
            );
        }
    } else {
        debug!("Settings not initialized, nothing to save");
    }
}

pub fn header() -> HeaderSettingsFile {
    let manager = MANAGER.as_ref().lock().unwrap();
    manager.content.as_ref().unwrap().config.header.clone()
}

pub fn server_address() -> String {
    let manager = MANAGER.as_ref().lock().unwrap();
    manager
        .content
        .as_ref()
        .unwrap()
        .config
        .server
        .address
        .clone()
}

pub fn set_server_address(address: &str) {
    {
        let mut manager = MANAGER.lock().unwrap();
        manager.content.as_mut().unwrap().config.server.address = address.into();
    }
    save();
}

pub fn telemetry() -> TelemetrySettings {
    let manager = MANAGER.as_ref().lock().unwrap();
    manager.content.as_ref().unwrap().config.telemetry.clone()
}

pub fn set_telemetry(telemetry: &TelemetrySettings) {
    {
        let mut manager = MANAGER.lock().unwrap();
        manager.content.as_mut().unwrap().config.telemetry = telemetry.clone();
    }
    save();
}

pub fn set_serial_port(port: &str) {
    {
        let mut manager = MANAGER.lock().unwrap();
        manager.content.as_mut().unwrap().config.telemetry.serial.port = port.into();
    }
    save();
}

pub fn set_serial_baud(baud: u32) {
    {
        let mut manager = MANAGER.lock().unwrap();
        manager.content.as_mut().unwrap().config.telemetry.serial.baud = baud;
    }
    save();
}
