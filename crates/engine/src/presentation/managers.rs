use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub mode_persistent: bool,
    pub concentration_persistent: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            mode_persistent: true,
            concentration_persistent: true,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManagerError {
    #[error("manager `{name}` is unavailable after shutdown")]
    Unavailable { name: &'static str },
    #[error("manager `{name}` has not been created yet")]
    NotCreated { name: &'static str },
}

/// Owner of one process-wide manager instance.
///
/// A scene-placed instance wins over on-demand creation; after `shutdown`
/// nothing is ever created again.
#[derive(Debug)]
pub struct ManagerSlot<T> {
    name: &'static str,
    persistent: bool,
    instance: Option<T>,
    shut_down: bool,
}

impl<T> ManagerSlot<T> {
    pub fn new(name: &'static str, persistent: bool) -> Self {
        Self {
            name,
            persistent,
            instance: None,
            shut_down: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn is_available(&self) -> bool {
        !self.shut_down && self.instance.is_some()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Keeps the first placed candidate. Returns whether one was installed.
    pub fn install_placed(&mut self, candidates: Vec<T>) -> Result<bool, ManagerError> {
        self.ensure_open()?;
        let found = candidates.len();
        let mut candidates = candidates.into_iter();

        if self.instance.is_some() {
            if found > 0 {
                error!(
                    manager = self.name,
                    duplicates = found,
                    "manager_duplicate_instance"
                );
            }
            return Ok(false);
        }

        let Some(first) = candidates.next() else {
            return Ok(false);
        };
        if found > 1 {
            error!(
                manager = self.name,
                duplicates = found - 1,
                "manager_duplicate_instance"
            );
        }
        self.instance = Some(first);
        info!(manager = self.name, "manager_placed_instance_installed");
        Ok(true)
    }

    pub fn get_or_create(&mut self, create: impl FnOnce() -> T) -> Result<&mut T, ManagerError> {
        self.ensure_open()?;
        if self.instance.is_none() {
            info!(manager = self.name, "manager_created");
        }
        Ok(self.instance.get_or_insert_with(create))
    }

    pub fn get(&self) -> Result<&T, ManagerError> {
        self.ensure_open()?;
        self.instance
            .as_ref()
            .ok_or(ManagerError::NotCreated { name: self.name })
    }

    pub fn get_mut(&mut self) -> Result<&mut T, ManagerError> {
        self.ensure_open()?;
        self.instance
            .as_mut()
            .ok_or(ManagerError::NotCreated { name: self.name })
    }

    pub fn on_scene_unload(&mut self) {
        if self.persistent || self.instance.is_none() {
            return;
        }
        self.instance = None;
        debug!(manager = self.name, "manager_dropped_with_scene");
    }

    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.instance = None;
        info!(manager = self.name, "manager_shut_down");
    }

    fn ensure_open(&self) -> Result<(), ManagerError> {
        if self.shut_down {
            Err(ManagerError::Unavailable { name: self.name })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_placed_instance_wins() {
        let mut slot = ManagerSlot::new("concentration", true);
        assert_eq!(slot.install_placed(vec![1, 2, 3]), Ok(true));
        assert_eq!(slot.get(), Ok(&1));

        // Later placements are duplicates of the live instance.
        assert_eq!(slot.install_placed(vec![9]), Ok(false));
        assert_eq!(slot.get(), Ok(&1));
    }

    #[test]
    fn placed_instance_beats_lazy_creation() {
        let mut slot = ManagerSlot::new("mode", true);
        slot.install_placed(vec!["placed"]).unwrap();
        let value = slot.get_or_create(|| "created").unwrap();
        assert_eq!(*value, "placed");
    }

    #[test]
    fn lazy_creation_runs_once() {
        let mut slot = ManagerSlot::new("mode", true);
        assert_eq!(slot.get(), Err(ManagerError::NotCreated { name: "mode" }));
        let mut calls = 0;
        for _ in 0..3 {
            slot.get_or_create(|| {
                calls += 1;
                7
            })
            .unwrap();
        }
        assert_eq!(calls, 1);
        *slot.get_mut().unwrap() += 1;
        assert_eq!(slot.get(), Ok(&8));
    }

    #[test]
    fn scene_unload_respects_persistence() {
        let mut kept = ManagerSlot::new("kept", true);
        let mut dropped = ManagerSlot::new("dropped", false);
        kept.get_or_create(|| 1).unwrap();
        dropped.get_or_create(|| 1).unwrap();

        kept.on_scene_unload();
        dropped.on_scene_unload();
        assert!(kept.is_available());
        assert!(!dropped.is_available());
        assert_eq!(dropped.get_or_create(|| 2).map(|v| *v), Ok(2));
    }

    #[test]
    fn shutdown_is_terminal() {
        let mut slot = ManagerSlot::new("concentration", true);
        slot.get_or_create(|| 5).unwrap();
        slot.shutdown();

        let unavailable = ManagerError::Unavailable {
            name: "concentration",
        };
        assert_eq!(slot.get(), Err(unavailable));
        assert_eq!(
            slot.get_or_create(|| 6).map(|v| *v),
            Err(ManagerError::Unavailable {
                name: "concentration"
            })
        );
        assert_eq!(
            slot.install_placed(vec![7]),
            Err(ManagerError::Unavailable {
                name: "concentration"
            })
        );
        assert!(slot.is_shut_down());
    }
}
