//! Opening the classroom for this device.

use dreamclass_core::{
    ChangeChannel, ClassStore, Classroom, ClassroomError, FileStore, Reconciliation,
    RemoteSettings, RemoteStore, RowStore, StorageError, SupabaseBackend,
};

use crate::config::{Config, ConfigSource, ConfigValue};

pub fn class_store(config: &Config) -> ClassStore {
    ClassStore::new(FileStore::new(config.data_dir.value.clone()))
}

/// Remote credentials in effect: saved on the device first, then config.
pub fn resolve_remote(
    config: &Config,
    store: &ClassStore,
) -> Result<Option<ConfigValue<RemoteSettings>>, StorageError> {
    if let Some(settings) = store.remote_settings()? {
        return Ok(Some(ConfigValue::new(settings, ConfigSource::Device)));
    }

    let source = if std::env::var("DREAMCLASS_SUPABASE_URL").is_ok() {
        ConfigSource::Environment
    } else {
        ConfigSource::File
    };
    Ok(config
        .sync
        .remote_settings()
        .map(|settings| ConfigValue::new(settings, source)))
}

pub fn open_classroom(config: &Config) -> Result<Classroom<SupabaseBackend>, ClassroomError> {
    let store = class_store(config);
    let remote = match resolve_remote(config, &store)? {
        Some(settings) => RemoteStore::Connected(SupabaseBackend::new(settings.value)),
        None => RemoteStore::Unconfigured,
    };
    Classroom::open(store, remote, config.sync.debounce())
}

/// Pulls the shared class before a one-shot command edits it, so the push
/// that follows carries other devices' changes. On failure the command
/// carries on with this device's copy.
pub async fn catch_up<B: RowStore + ChangeChannel>(
    classroom: &mut Classroom<B>,
) -> Option<Reconciliation> {
    match classroom.refresh_now().await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            eprintln!(
                "Warning: could not fetch the shared class, using this device's copy: {}",
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreamclass_core::{MemoryBackend, MemoryStore, ShareCode, ShareCodeGenerator, SkipReason};
    use std::io::Write;
    use tempfile::tempdir;

    fn config_with_sync(dir: &std::path::Path) -> Config {
        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "data_dir: {}", dir.join("data").display()).unwrap();
        writeln!(file, "sync:").unwrap();
        writeln!(file, "  url: https://fromfile.supabase.co").unwrap();
        writeln!(file, "  key: file-key").unwrap();
        Config::load(Some(config_path)).unwrap()
    }

    #[test]
    fn test_device_credentials_win() {
        let temp_dir = tempdir().unwrap();
        let config = config_with_sync(temp_dir.path());
        let store = class_store(&config);

        let from_config = resolve_remote(&config, &store).unwrap().unwrap();
        assert_eq!(from_config.value.url, "https://fromfile.supabase.co");

        store
            .save_remote_settings(&RemoteSettings {
                url: "https://device.supabase.co".to_string(),
                key: "device-key".to_string(),
            })
            .unwrap();
        let from_device = resolve_remote(&config, &store).unwrap().unwrap();
        assert_eq!(from_device.value.url, "https://device.supabase.co");
        assert_eq!(from_device.source, ConfigSource::Device);
    }

    #[test]
    fn test_open_classroom_uses_data_dir() {
        let temp_dir = tempdir().unwrap();
        let config = config_with_sync(temp_dir.path());

        let mut classroom = open_classroom(&config).unwrap();
        classroom.add_student("Hana", 1).unwrap();

        let reopened = open_classroom(&config).unwrap();
        assert_eq!(reopened.data().students.len(), 1);
    }

    struct FixedCode;

    impl ShareCodeGenerator for FixedCode {
        fn generate(&self) -> ShareCode {
            ShareCode::parse("푸른하늘-1234").unwrap()
        }
    }

    fn memory_classroom(backend: &MemoryBackend) -> Classroom<MemoryBackend> {
        Classroom::open(
            ClassStore::new(MemoryStore::new()),
            RemoteStore::Connected(backend.clone()),
            std::time::Duration::from_millis(10),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_catch_up_pulls_newer_class() {
        let backend = MemoryBackend::new();
        let mut first = memory_classroom(&backend);
        let connection = first.connect_new(&FixedCode).await.unwrap();

        let mut second = memory_classroom(&backend);
        second.connect_existing(connection.code).await.unwrap();

        first.add_student("Hana", 1).unwrap();
        first.push_now().await.unwrap();

        assert!(matches!(
            catch_up(&mut second).await,
            Some(Reconciliation::Applied(_))
        ));
        assert_eq!(second.data().students.len(), 1);
    }

    #[tokio::test]
    async fn test_catch_up_offline_keeps_local_copy() {
        let backend = MemoryBackend::new();
        let mut room = memory_classroom(&backend);
        room.add_student("Hana", 1).unwrap();
        room.connect_new(&FixedCode).await.unwrap();

        backend.set_offline(true);
        assert_eq!(catch_up(&mut room).await, None);

        room.add_student("Minjun", 2).unwrap();
        assert_eq!(room.data().students.len(), 2);
    }

    #[tokio::test]
    async fn test_catch_up_unshared_is_skipped() {
        let backend = MemoryBackend::new();
        let mut room = memory_classroom(&backend);
        assert_eq!(
            catch_up(&mut room).await,
            Some(Reconciliation::Skipped(SkipReason::NoShareCode))
        );
    }
}
