//! In-memory recording of per-generation statistics.
//!
//! A [`StatsLog`] holds one series per registered key. Keys are fixed up
//! front; every record must supply exactly the registered keys, so series
//! always have equal lengths.

use std::collections::BTreeMap;
use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("statistic '{0}' is already registered")]
    Duplicate(String),

    #[error("statistic '{0}' is not registered")]
    Unknown(String),

    #[error("record is missing registered statistic '{0}'")]
    Missing(String),
}
pub type StatsResult<T> = Result<T, StatsError>;
use StatsError::*;

/// Recorded series of named statistics.
#[derive(Clone, Debug, Default)]
pub struct StatsLog {
    keys: Vec<String>,
    series: FxHashMap<String, Vec<Option<f64>>>,
}

impl StatsLog {
    /// Create a new, empty log.
    pub fn new() -> Self { Self::default() }

    /// Create a new log with the keys of a statistics snapshot registered.
    pub fn from_snapshot(snapshot: &BTreeMap<String, Option<f64>>)
        -> StatsResult<Self>
    {
        let mut log = Self::new();
        log.register(snapshot.keys().cloned())?;
        Ok(log)
    }

    /// Register new keys. Fails without registering anything if any key is
    /// already present (or repeated).
    pub fn register<I, S>(&mut self, keys: I) -> StatsResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(|k| k.into()).collect();
        for (k, key) in keys.iter().enumerate() {
            if self.series.contains_key(key) || keys[..k].contains(key) {
                return Err(Duplicate(key.clone()));
            }
        }
        for key in keys.into_iter() {
            self.series.insert(key.clone(), Vec::new());
            self.keys.push(key);
        }
        Ok(())
    }

    /// Append one snapshot. Fails without recording anything if the
    /// snapshot holds an unregistered key or lacks a registered one.
    pub fn record(&mut self, snapshot: &BTreeMap<String, Option<f64>>)
        -> StatsResult<()>
    {
        if let Some(key) = snapshot.keys().find(|k| !self.series.contains_key(*k)) {
            return Err(Unknown(key.clone()));
        }
        if let Some(key) = self.keys.iter().find(|k| !snapshot.contains_key(*k)) {
            return Err(Missing(key.clone()));
        }
        for (key, value) in snapshot.iter() {
            if let Some(series) = self.series.get_mut(key) {
                series.push(*value);
            }
        }
        Ok(())
    }

    /// Return the registered keys in registration order.
    pub fn keys(&self) -> &[String] { &self.keys }

    /// Return the series recorded for `key`.
    pub fn series(&self, key: &str) -> StatsResult<&[Option<f64>]> {
        self.series.get(key)
            .map(|s| s.as_slice())
            .ok_or_else(|| Unknown(key.to_string()))
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.keys.first()
            .and_then(|k| self.series.get(k))
            .map(|s| s.len())
            .unwrap_or(0)
    }

    /// Return `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, Option<f64>)]) -> BTreeMap<String, Option<f64>> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn registration() {
        let mut log = StatsLog::new();
        log.register(["best_fit", "n_evals"]).unwrap();
        assert!(matches!(log.register(["n_evals"]), Err(Duplicate(_))));
        assert!(matches!(log.register(["a", "a"]), Err(Duplicate(_))));
        assert_eq!(log.keys(), &["best_fit", "n_evals"]);
    }

    #[test]
    fn recording() {
        let mut log = StatsLog::new();
        log.register(["best_fit", "n_evals"]).unwrap();
        log.record(&snapshot(&[("best_fit", None), ("n_evals", Some(1.0))]))
            .unwrap();
        log.record(&snapshot(&[("best_fit", Some(0.5)), ("n_evals", Some(2.0))]))
            .unwrap();
        assert!(matches!(
            log.record(&snapshot(&[("best_fit", Some(0.5))])),
            Err(Missing(_)),
        ));
        assert!(matches!(
            log.record(&snapshot(&[
                ("best_fit", Some(0.5)),
                ("n_evals", Some(3.0)),
                ("mean_fit", Some(0.7)),
            ])),
            Err(Unknown(_)),
        ));
        assert_eq!(log.len(), 2);
        assert_eq!(log.series("best_fit").unwrap(), &[None, Some(0.5)]);
        assert_eq!(log.series("n_evals").unwrap(), &[Some(1.0), Some(2.0)]);
        assert!(log.series("mean_fit").is_err());
    }

    #[test]
    fn from_snapshot() {
        let snap = snapshot(&[("best_fit", None), ("n_evals", Some(0.0))]);
        let mut log = StatsLog::from_snapshot(&snap).unwrap();
        log.record(&snap).unwrap();
        assert_eq!(log.len(), 1);
    }
}
