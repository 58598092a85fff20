use std::collections::HashMap;

use async_trait::async_trait;
use tracing::info;

use super::repository::{QuoteRepository, RepositoryError};

/// Which store backend to open, and how to reach it.
///
/// | backend  | connection_string            |
/// |----------|------------------------------|
/// | `sqlite` | `quotes.db`, `:memory:`      |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Name of a registered [`RepositoryFactory`].
    pub backend: String,
    /// Handed to the factory untouched.
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "shop_quotes.db".to_string(),
        }
    }
}

/// Opens a [`QuoteRepository`] for one backend. Backend crates export a unit
/// struct implementing this and the front end registers it at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Connects and prepares the store (schema, default data) for use.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn QuoteRepository>, RepositoryError>;
}

/// Backend factories keyed by name.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `factory`, replacing any factory already registered under the
    /// same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names, sorted.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens a repository with the factory named by `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] if no such backend is registered.
    /// * Whatever the factory returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn QuoteRepository>, RepositoryError> {
        let factory = self.factories.get(config.backend.as_str()).ok_or_else(|| {
            RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {:?}",
                config.backend,
                self.available_backends()
            ))
        })?;

        info!(backend = %config.backend, target = %config.connection_string, "opening store");
        factory.create(config).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{Customer, NewSalesOrder, Product, SalesOrder};

    // Routing tests never touch the store itself.
    struct StubRepository;

    #[async_trait]
    impl QuoteRepository for StubRepository {
        async fn get_settings(&self) -> Result<HashMap<String, Decimal>, RepositoryError> {
            Ok(HashMap::new())
        }
        async fn update_settings(
            &self,
            _settings: &HashMap<String, Decimal>,
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn get_all_materials(&self) -> Result<BTreeMap<String, Decimal>, RepositoryError> {
            Ok(BTreeMap::new())
        }
        async fn update_materials(
            &self,
            _materials: &BTreeMap<String, Decimal>,
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn add_material(
            &self,
            _name: &str,
            _cost: Decimal,
        ) -> Result<bool, RepositoryError> {
            unimplemented!()
        }
        async fn delete_material(&self, _name: &str) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn list_customers(&self) -> Result<Vec<Customer>, RepositoryError> {
            unimplemented!()
        }
        async fn add_customer(&self, _name: &str) -> Result<Customer, RepositoryError> {
            unimplemented!()
        }
        async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
            unimplemented!()
        }
        async fn get_product(&self, _id: i64) -> Result<Product, RepositoryError> {
            unimplemented!()
        }
        async fn add_product(
            &self,
            _name: &str,
            _unit_price: Decimal,
        ) -> Result<Product, RepositoryError> {
            unimplemented!()
        }
        async fn create_sales_order(
            &self,
            _order: NewSalesOrder,
        ) -> Result<SalesOrder, RepositoryError> {
            unimplemented!()
        }
        async fn get_sales_order(&self, _id: i64) -> Result<SalesOrder, RepositoryError> {
            unimplemented!()
        }
    }

    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RepositoryFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn QuoteRepository>, RepositoryError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(StubRepository))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl RepositoryFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn QuoteRepository>, RepositoryError> {
            Err(RepositoryError::Connection("refused".to_string()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn RepositoryFactory>, Arc<AtomicBool>) {
        let called = Arc::new(AtomicBool::new(false));
        let factory = StubFactory {
            name,
            called: called.clone(),
        };
        (Box::new(factory), called)
    }

    fn config(backend: &str) -> DbConfig {
        DbConfig {
            backend: backend.to_string(),
            connection_string: ":memory:".to_string(),
        }
    }

    // ===== registration tests =====

    #[test]
    fn default_config_is_sqlite_file() {
        let config = DbConfig::default();

        assert_eq!(config.backend, "sqlite");
        assert_eq!(config.connection_string, "shop_quotes.db");
    }

    #[test]
    fn empty_registry_has_no_backends() {
        assert!(RepositoryRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn backends_are_listed_sorted() {
        let mut registry = RepositoryRegistry::new();
        registry.register(stub_factory("sqlite").0);
        registry.register(stub_factory("postgres").0);

        assert_eq!(registry.available_backends(), vec!["postgres", "sqlite"]);
    }

    #[test]
    fn registering_same_name_replaces_factory() {
        let mut registry = RepositoryRegistry::new();
        registry.register(stub_factory("sqlite").0);
        registry.register(stub_factory("sqlite").0);

        assert_eq!(registry.available_backends(), vec!["sqlite"]);
    }

    // ===== dispatch tests =====

    #[tokio::test]
    async fn create_uses_matching_factory_only() {
        let mut registry = RepositoryRegistry::new();
        let (sqlite, sqlite_called) = stub_factory("sqlite");
        let (postgres, postgres_called) = stub_factory("postgres");
        registry.register(sqlite);
        registry.register(postgres);

        let repo = registry.create(&config("sqlite")).await.unwrap();

        assert!(sqlite_called.load(Ordering::SeqCst));
        assert!(!postgres_called.load(Ordering::SeqCst));
        let (rates, materials) = repo.load_snapshot().await.unwrap();
        assert!(rates.hourly_rates.is_empty());
        assert!(materials.is_empty());
    }

    #[tokio::test]
    async fn unknown_backend_names_requested_and_available() {
        let mut registry = RepositoryRegistry::new();
        registry.register(stub_factory("sqlite").0);

        let err = registry.create(&config("postgres")).await.err();

        match err {
            Some(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("postgres"));
                assert!(msg.contains("sqlite"));
            }
            other => panic!("expected Configuration error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn factory_error_is_propagated() {
        let mut registry = RepositoryRegistry::new();
        registry.register(Box::new(FailingFactory));

        let err = registry.create(&config("failing")).await.err();

        assert_eq!(err, Some(RepositoryError::Connection("refused".to_string())));
    }
}
