use std::collections::HashMap;

use core_sim::{SimulationKey, SimulationResult};

use crate::{check_rows, CacheError, ResultCache};

#[derive(Debug, Default, Clone)]
pub struct InMemoryResultCache {
    entries: HashMap<SimulationKey, SimulationResult>,
}

impl InMemoryResultCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultCache for InMemoryResultCache {
    fn get(&self, key: &SimulationKey) -> Result<Option<SimulationResult>, CacheError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &SimulationKey, result: &SimulationResult) -> Result<(), CacheError> {
        check_rows(key, result)?;
        self.entries.insert(*key, result.clone());
        Ok(())
    }

    fn len(&self) -> Result<usize, CacheError> {
        Ok(self.entries.len())
    }
}
