use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use super::controller::MirrorController;
use super::kind::Mirrored;
use crate::class::{ClassConfig, InitArgs, Interceptor, SetupPlugin};
use crate::model::{Record, RecordSet};
use crate::storage::SharedStore;

/// Setup plugin that mirrors instances of classes declaring `safe`.
#[derive(Clone)]
pub struct SafePlugin {
    store: SharedStore,
}

impl SafePlugin {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

impl<T: Mirrored> SetupPlugin<T> for SafePlugin {
    fn name(&self) -> &str {
        "safe"
    }

    fn setup(&self, instance: &mut T, config: &ClassConfig, args: &InitArgs) -> Result<()> {
        let Some(safe) = &config.safe else {
            return Ok(());
        };

        let Some(controller) =
            MirrorController::attach(safe.key(), instance, self.store.clone(), safe.options())?
        else {
            return Ok(());
        };

        // Seed data was applied silently before the plugins ran. It only
        // goes to the slot when the instance already holds the slot content.
        if args.seed.is_some() && controller.covers_slot() {
            debug!(uid = controller.uid(), "Persisting seed data");
            controller.store(instance)?;
        }
        Ok(())
    }
}

/// Record and record-set interceptors with the safe plugin installed.
pub struct SafeInterceptors {
    pub records: Interceptor<Record>,
    pub record_sets: Interceptor<RecordSet>,
}

/// Wrap both base kinds with a `SafePlugin` bound to `store`.
pub fn safe_interceptors(store: SharedStore) -> SafeInterceptors {
    let plugin = SafePlugin::new(store);
    let for_records: Arc<dyn SetupPlugin<Record>> = Arc::new(plugin.clone());
    let for_record_sets: Arc<dyn SetupPlugin<RecordSet>> = Arc::new(plugin);
    SafeInterceptors {
        records: Interceptor::wrap(vec![for_records]),
        record_sets: Interceptor::wrap(vec![for_record_sets]),
    }
}
