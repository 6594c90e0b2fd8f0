//! # Relation Store
//!
//! A controlled vocabulary of predicates and the directed
//! (subject, predicate, object) triples they form between documents.
//!
//! Every triple is kept under three orderings so that lookups by subject,
//! by object and by predicate are each a prefix scan:
//! - `Relations`: (subject, object, predicate)
//! - `RelationsByObject`: (object, subject, predicate)
//! - `RelationsByPredicate`: (predicate, subject, object)

use crate::storage::{Key, Persistence, Sequence, Statement, Table, encode};
use crate::types::require_id;
use crate::vault::Vault;
use crate::{DocumentId, Predicate, PredicateId, Relation, ResourceKind, SatchelError};

/// Handle to the relations of one vault.
pub struct Relations<'a, P: Persistence> {
    vault: &'a Vault<P>,
}

/// The three index rows of one triple.
fn triple_rows(relation: &Relation) -> [(Table, Key); 3] {
    let (s, o, p) = (relation.subject.0, relation.object.0, relation.predicate.0);
    [
        (Table::Relations, Key::of(&[s, o, p])),
        (Table::RelationsByObject, Key::of(&[o, s, p])),
        (Table::RelationsByPredicate, Key::of(&[p, s, o])),
    ]
}

fn delete_triple(relation: &Relation) -> Vec<Statement> {
    triple_rows(relation)
        .into_iter()
        .map(|(table, key)| Statement::delete(table, key))
        .collect()
}

impl<'a, P: Persistence> Relations<'a, P> {
    pub(crate) fn new(vault: &'a Vault<P>) -> Self {
        Self { vault }
    }

    // =========================================================================
    // PREDICATES
    // =========================================================================

    /// Add a predicate to the vocabulary. Texts are unique.
    pub fn new_predicate(&self, text: &str) -> Result<PredicateId, SatchelError> {
        self.vault.config().check_name("predicate", text)?;
        if self.find_predicate(text)?.is_some() {
            return Err(SatchelError::DuplicateName(text.to_string()));
        }

        let id = PredicateId(self.vault.store().next_identifier(Sequence::Predicate)?);
        let predicate = Predicate {
            id,
            text: text.to_string(),
        };
        self.vault.execute_unique(
            &[
                Statement::insert(Table::PredicateNames, Key::name(text), encode(&id)?),
                Statement::insert(Table::Predicates, Key::of(&[id.0]), encode(&predicate)?),
            ],
            text,
        )?;
        tracing::debug!(predicate = %id, text, "created predicate");
        Ok(id)
    }

    pub fn predicate(&self, id: PredicateId) -> Result<Predicate, SatchelError> {
        require_id(id.0, ResourceKind::Predicate)?;
        self.vault.require(
            Table::Predicates,
            &Key::of(&[id.0]),
            ResourceKind::Predicate,
            id,
        )
    }

    pub fn predicates(&self) -> Result<Vec<Predicate>, SatchelError> {
        self.vault.fetch_all(Table::Predicates, &Key::new())
    }

    pub fn find_predicate(&self, text: &str) -> Result<Option<PredicateId>, SatchelError> {
        self.vault.fetch(Table::PredicateNames, &Key::name(text))
    }

    /// Remove a predicate and every relation that uses it.
    pub fn delete_predicate(&self, id: PredicateId) -> Result<u64, SatchelError> {
        let predicate = self.predicate(id)?;

        let mut statements = Vec::new();
        let mut removed = 0u64;
        for row in self
            .vault
            .store()
            .scan(Table::RelationsByPredicate, &Key::of(&[id.0]))?
        {
            if let (Some(s), Some(o)) = (row.key.id_at(1), row.key.id_at(2)) {
                statements.extend(delete_triple(&Relation {
                    subject: DocumentId(s),
                    object: DocumentId(o),
                    predicate: id,
                }));
                removed = removed.saturating_add(1);
            }
        }
        statements.push(Statement::delete(
            Table::PredicateNames,
            Key::name(&predicate.text),
        ));
        statements.push(Statement::delete(Table::Predicates, Key::of(&[id.0])));

        self.vault.execute(&statements)?;
        tracing::debug!(predicate = %id, relations = removed, "deleted predicate");
        Ok(removed)
    }

    // =========================================================================
    // TRIPLES
    // =========================================================================

    /// Link `subject` to `object` with `predicate`.
    ///
    /// Fails with `DuplicateName` if this exact triple already exists.
    pub fn new_relation(
        &self,
        subject: DocumentId,
        object: DocumentId,
        predicate: PredicateId,
    ) -> Result<(), SatchelError> {
        require_id(subject.0, ResourceKind::Document)?;
        require_id(object.0, ResourceKind::Document)?;
        require_id(predicate.0, ResourceKind::Predicate)?;
        self.vault.registry().get(subject)?;
        self.vault.registry().get(object)?;
        let vocabulary = self.predicate(predicate)?;

        let relation = Relation {
            subject,
            object,
            predicate,
        };
        let statements: Vec<Statement> = triple_rows(&relation)
            .into_iter()
            .map(|(table, key)| Statement::insert(table, key, Vec::new()))
            .collect();
        let label = format!("{} {} {}", subject, vocabulary.text, object);
        self.vault.execute_unique(&statements, &label)?;
        tracing::debug!(%subject, %object, %predicate, "created relation");
        Ok(())
    }

    /// Predicates linking the ordered pair. (A, B) and (B, A) are distinct.
    pub fn relations_between(
        &self,
        subject: DocumentId,
        object: DocumentId,
    ) -> Result<Vec<PredicateId>, SatchelError> {
        require_id(subject.0, ResourceKind::Document)?;
        require_id(object.0, ResourceKind::Document)?;
        Ok(self
            .vault
            .ids_under(Table::Relations, &Key::of(&[subject.0, object.0]), 2)?
            .into_iter()
            .map(PredicateId)
            .collect())
    }

    /// Remove one triple. Returns 1 if it existed, 0 otherwise.
    pub fn remove_specific(
        &self,
        subject: DocumentId,
        object: DocumentId,
        predicate: PredicateId,
    ) -> Result<u64, SatchelError> {
        require_id(subject.0, ResourceKind::Document)?;
        require_id(object.0, ResourceKind::Document)?;
        require_id(predicate.0, ResourceKind::Predicate)?;
        let affected = self.vault.execute(&delete_triple(&Relation {
            subject,
            object,
            predicate,
        }))?;
        Ok(u64::from(affected > 0))
    }

    /// Remove every predicate between the ordered pair. Returns the number of triples removed.
    pub fn remove_all(&self, subject: DocumentId, object: DocumentId) -> Result<u64, SatchelError> {
        let predicates = self.relations_between(subject, object)?;
        if predicates.is_empty() {
            return Ok(0);
        }
        let statements: Vec<Statement> = predicates
            .iter()
            .flat_map(|&predicate| {
                delete_triple(&Relation {
                    subject,
                    object,
                    predicate,
                })
            })
            .collect();
        self.vault.execute(&statements)?;
        Ok(predicates.len() as u64)
    }

    /// Outgoing relations of a document.
    pub fn relations_from(&self, subject: DocumentId) -> Result<Vec<Relation>, SatchelError> {
        require_id(subject.0, ResourceKind::Document)?;
        Ok(self
            .vault
            .store()
            .scan(Table::Relations, &Key::of(&[subject.0]))?
            .iter()
            .filter_map(|row| {
                Some(Relation {
                    subject,
                    object: DocumentId(row.key.id_at(1)?),
                    predicate: PredicateId(row.key.id_at(2)?),
                })
            })
            .collect())
    }

    /// Incoming relations of a document.
    pub fn relations_to(&self, object: DocumentId) -> Result<Vec<Relation>, SatchelError> {
        require_id(object.0, ResourceKind::Document)?;
        Ok(self
            .vault
            .store()
            .scan(Table::RelationsByObject, &Key::of(&[object.0]))?
            .iter()
            .filter_map(|row| {
                Some(Relation {
                    subject: DocumentId(row.key.id_at(1)?),
                    object,
                    predicate: PredicateId(row.key.id_at(2)?),
                })
            })
            .collect())
    }
}
