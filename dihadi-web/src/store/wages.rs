//! Regional wage benchmarks

#[cfg(feature = "sqlite")]
use super::database::DatabaseWageStore;
use dihadi_core::{DihadiResult, WageBenchmark, WageFilter};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub enum WageStore {
    Memory(Arc<RwLock<Vec<WageBenchmark>>>),
    #[cfg(feature = "sqlite")]
    Database(DatabaseWageStore),
}

impl Default for WageStore {
    fn default() -> Self {
        Self::memory()
    }
}

impl WageStore {
    pub fn memory() -> Self {
        Self::Memory(Arc::new(RwLock::new(Vec::new())))
    }

    pub async fn insert(&self, wage: WageBenchmark) -> DihadiResult<WageBenchmark> {
        match self {
            Self::Memory(wages) => {
                wages.write().await.push(wage.clone());
                Ok(wage)
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db) => db.insert(wage).await,
        }
    }

    /// Benchmarks matching `filter`, most recently updated first
    pub async fn list(&self, filter: &WageFilter) -> DihadiResult<Vec<WageBenchmark>> {
        match self {
            Self::Memory(wages) => {
                let mut matching: Vec<WageBenchmark> = wages
                    .read()
                    .await
                    .iter()
                    .filter(|w| filter.matches(w))
                    .cloned()
                    .collect();
                matching.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
                Ok(matching)
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db) => db.list(filter).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dihadi_core::{NewWage, WageLocation};

    fn benchmark(category: &str, city: &str) -> WageBenchmark {
        WageBenchmark::new(
            NewWage {
                category: category.to_string(),
                location: WageLocation {
                    city: city.to_string(),
                    state: "Karnataka".to_string(),
                },
                average_wage: 550.0,
                min_wage: None,
                max_wage: None,
                currency: None,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_filter_by_city_substring() {
        let store = WageStore::memory();
        store.insert(benchmark("construction", "Bengaluru")).await.unwrap();
        store.insert(benchmark("domestic", "Mysuru")).await.unwrap();

        let filter = WageFilter {
            city: Some("BENGAL".to_string()),
            ..Default::default()
        };
        let wages = store.list(&filter).await.unwrap();

        assert_eq!(wages.len(), 1);
        assert_eq!(wages[0].category, "construction");
        assert_eq!(store.list(&WageFilter::default()).await.unwrap().len(), 2);
    }
}
