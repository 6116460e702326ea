use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

use crate::{
    models::{Person, PersonId},
    AppResult,
};

/// Read-only view of the identity directory.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn get_person(&self, id: PersonId) -> AppResult<Option<Person>>;
    /// Active people ordered by name.
    async fn list_people(&self) -> AppResult<Vec<Person>>;
}

const PERSON_COLUMNS: &str = r#"id, name, scope_id, cohort_id, is_manager, is_admin, joined_at, active"#;

/// Directory backed by the externally maintained `"People"` table.
pub struct PgDirectory {
    db: sqlx::PgPool,
    // Cache people per id (30-second TTL)
    people: Cache<PersonId, Person>,
}

impl PgDirectory {
    pub fn new(db: sqlx::PgPool) -> Self {
        Self {
            db,
            people: Cache::builder()
                .time_to_live(Duration::from_secs(30))
                .max_capacity(10_000)
                .build(),
        }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn get_person(&self, id: PersonId) -> AppResult<Option<Person>> {
        if let Some(cached) = self.people.get(&id).await {
            return Ok(Some(cached));
        }

        let person = sqlx::query_as::<_, Person>(&format!(r#"SELECT {} FROM "People" WHERE id = $1"#, PERSON_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, person_id = id, "Directory lookup failed");
                e
            })?;

        if let Some(person) = &person {
            self.people.insert(id, person.clone()).await;
        }
        Ok(person)
    }

    async fn list_people(&self) -> AppResult<Vec<Person>> {
        let people = sqlx::query_as::<_, Person>(&format!(
            r#"SELECT {} FROM "People" WHERE active ORDER BY name, id"#,
            PERSON_COLUMNS
        ))
        .fetch_all(&self.db)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Directory listing failed");
            e
        })?;

        for person in &people {
            self.people.insert(person.id, person.clone()).await;
        }
        Ok(people)
    }
}

#[cfg(test)]
pub use memory::MemoryDirectory;

#[cfg(test)]
mod memory {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct MemoryDirectory {
        people: RwLock<BTreeMap<PersonId, Person>>,
    }

    impl MemoryDirectory {
        pub fn new(people: impl IntoIterator<Item = Person>) -> Self {
            Self {
                people: RwLock::new(people.into_iter().map(|p| (p.id, p)).collect()),
            }
        }
    }

    #[async_trait]
    impl Directory for MemoryDirectory {
        async fn get_person(&self, id: PersonId) -> AppResult<Option<Person>> {
            Ok(self.people.read().await.get(&id).cloned())
        }

        async fn list_people(&self) -> AppResult<Vec<Person>> {
            let mut people: Vec<Person> = self.people.read().await.values().filter(|p| p.active).cloned().collect();
            people.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            Ok(people)
        }
    }
}
