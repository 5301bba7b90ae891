//! Deploy order planning
//!
//! Partitions the services of an environment into levels: level 0 holds the
//! services without dependencies, level k the services whose dependencies are
//! all placed in levels below k. Services in one level never depend on each
//! other and can be processed concurrently.

use crate::error::{CoreError, Result};
use crate::model::Environment;
use std::collections::BTreeSet;
use tracing::debug;

/// Ordered levels of service names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOrder {
    levels: Vec<Vec<String>>,
}

impl DeployOrder {
    /// Compute the level partition for an environment
    ///
    /// Fails with `InvalidDependency` when a dependency names an unknown service,
    /// `DuplicateDependency` when one is listed twice (both checked before any
    /// layering) and with `CircularDependency` when a pass places no service
    /// while some remain unplaced.
    pub fn plan(environment: &Environment) -> Result<Self> {
        for service in environment.services() {
            let mut declared = BTreeSet::new();
            if let Some(duplicate) = service
                .dependencies()
                .iter()
                .find(|dep| !declared.insert(dep.as_str()))
            {
                return Err(CoreError::DuplicateDependency {
                    service: service.service_name.clone(),
                    dependency: duplicate.clone(),
                });
            }
            if let Some(missing) = service
                .dependencies()
                .iter()
                .find(|dep| !environment.contains(dep))
            {
                return Err(CoreError::InvalidDependency {
                    service: service.service_name.clone(),
                    dependency: missing.clone(),
                });
            }
        }

        let mut unplaced: BTreeSet<&str> = environment.service_names().collect();
        let mut placed: BTreeSet<&str> = BTreeSet::new();
        let mut levels = Vec::new();

        while !unplaced.is_empty() {
            let level: Vec<&str> = unplaced
                .iter()
                .copied()
                .filter(|name| {
                    environment.service(name).is_some_and(|service| {
                        service
                            .dependencies()
                            .iter()
                            .all(|dep| placed.contains(dep.as_str()))
                    })
                })
                .collect();

            if level.is_empty() {
                return Err(CoreError::CircularDependency {
                    services: unplaced.iter().map(|s| s.to_string()).collect(),
                });
            }

            debug!(level = levels.len(), services = ?level, "Planned deploy level");
            for name in &level {
                unplaced.remove(name);
                placed.insert(*name);
            }
            levels.push(level.into_iter().map(String::from).collect());
        }

        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[Vec<String>] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&[String]> {
        self.levels.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level indices in deploy order
    pub fn ascending(&self) -> impl Iterator<Item = usize> {
        0..self.levels.len()
    }

    /// Level indices in teardown order
    pub fn descending(&self) -> impl Iterator<Item = usize> {
        (0..self.levels.len()).rev()
    }

    /// Level a service was placed in
    pub fn level_of(&self, service_name: &str) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.iter().any(|s| s == service_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountConfig, ServiceConfig, ServiceContext, ServiceType};
    use std::sync::Arc;

    fn environment(services: &[(&str, &[&str])]) -> Environment {
        let account = Arc::new(AccountConfig::new("123456789012", "us-west-2"));
        let mut env = Environment::new("shop", "dev", account.clone());
        for (name, deps) in services {
            let config = ServiceConfig::new("kv").with_dependencies(deps.iter().copied());
            env.add_service(ServiceContext::new(
                "shop",
                "dev",
                *name,
                ServiceType::builtin("kv"),
                config,
                account.clone(),
            ))
            .unwrap();
        }
        env
    }

    fn assert_leveling_invariant(env: &Environment, order: &DeployOrder) {
        let mut seen = BTreeSet::new();
        for service in env.services() {
            let level = order.level_of(&service.service_name).unwrap();
            assert!(seen.insert(service.service_name.clone()));
            for dep in service.dependencies() {
                assert!(order.level_of(dep).unwrap() < level);
            }
        }
        let total: usize = order.levels().iter().map(Vec::len).sum();
        assert_eq!(total, env.len());
    }

    #[test]
    fn test_shared_dependency() {
        let env = environment(&[("b", &[]), ("a", &["b"]), ("c", &["b"])]);
        let order = DeployOrder::plan(&env).unwrap();
        assert_eq!(
            order.levels(),
            &[vec!["b".to_string()], vec!["a".to_string(), "c".to_string()]]
        );
    }

    #[test]
    fn test_diamond_and_chain() {
        let env = environment(&[
            ("vpc", &[]),
            ("db", &["vpc"]),
            ("cache", &["vpc"]),
            ("api", &["db", "cache"]),
            ("web", &["api"]),
            ("logs", &[]),
        ]);
        let order = DeployOrder::plan(&env).unwrap();
        assert_eq!(order.len(), 4);
        assert_eq!(order.level(0).unwrap(), &["logs".to_string(), "vpc".to_string()]);
        assert_eq!(order.level_of("api"), Some(2));
        assert_eq!(order.level_of("web"), Some(3));
        assert_leveling_invariant(&env, &order);
    }

    #[test]
    fn test_level_waits_for_deepest_dependency() {
        let env = environment(&[("a", &[]), ("b", &["a"]), ("c", &["a", "b"])]);
        let order = DeployOrder::plan(&env).unwrap();
        assert_eq!(order.level_of("c"), Some(2));
        assert_leveling_invariant(&env, &order);
    }

    #[test]
    fn test_cycle_detected() {
        let env = environment(&[("a", &["c"]), ("b", &["a"]), ("c", &["b"]), ("d", &[])]);
        let err = DeployOrder::plan(&env).unwrap_err();
        assert_eq!(
            err,
            CoreError::CircularDependency {
                services: vec!["a".to_string(), "b".to_string(), "c".to_string()]
            }
        );
    }

    #[test]
    fn test_duplicate_dependency_rejected() {
        let env = environment(&[("b", &[]), ("a", &["b", "b"])]);
        assert_eq!(
            DeployOrder::plan(&env).unwrap_err(),
            CoreError::DuplicateDependency {
                service: "a".to_string(),
                dependency: "b".to_string(),
            }
        );
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let env = environment(&[("a", &["a"])]);
        assert!(matches!(
            DeployOrder::plan(&env),
            Err(CoreError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_invalid_dependency_reported_before_cycles() {
        let env = environment(&[("a", &["b"]), ("b", &["a"]), ("c", &["ghost"])]);
        let err = DeployOrder::plan(&env).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidDependency {
                service: "c".to_string(),
                dependency: "ghost".to_string()
            }
        );
    }

    #[test]
    fn test_plan_is_idempotent() {
        let env = environment(&[("x", &[]), ("y", &["x"]), ("z", &["x", "y"]), ("w", &[])]);
        let first = DeployOrder::plan(&env).unwrap();
        let second = DeployOrder::plan(&env).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_environment() {
        let env = environment(&[]);
        let order = DeployOrder::plan(&env).unwrap();
        assert!(order.is_empty());
        assert_eq!(order.descending().count(), 0);
    }

    #[test]
    fn test_descending_levels() {
        let env = environment(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);
        let order = DeployOrder::plan(&env).unwrap();
        assert_eq!(order.descending().collect::<Vec<_>>(), vec![2, 1, 0]);
    }
}
