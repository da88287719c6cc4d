//! Per-item classification steps driven by [`ClassificationBatch`](super::ClassificationBatch).

use async_trait::async_trait;

use crate::classify::{ClassifyError, ClassyFireClient};
use crate::compound::Compound;

use super::table::{Row, RowClassification};

/// How one batch item is classified.
#[async_trait]
pub trait BatchStep: Send + Sync {
    /// Input unit; also the unit that is deferred and retried.
    type Item: Send + Sync + Clone;
    /// Result yielded for one item.
    type Output: Send;

    /// Plural noun for progress and log messages.
    fn label(&self) -> &'static str;

    /// Classifies one item.
    async fn classify(
        &self,
        client: &ClassyFireClient,
        item: &Self::Item,
    ) -> Result<Self::Output, ClassifyError>;
}

/// Classifies InChIKeys.
#[derive(Debug, Clone, Copy, Default)]
pub struct InchikeyStep;

#[async_trait]
impl BatchStep for InchikeyStep {
    type Item = String;
    type Output = Compound;

    fn label(&self) -> &'static str {
        "InChIKeys"
    }

    async fn classify(
        &self,
        client: &ClassyFireClient,
        item: &String,
    ) -> Result<Compound, ClassifyError> {
        client.classify_inchikey(item).await
    }
}

/// Classifies SMILES strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmilesStep;

#[async_trait]
impl BatchStep for SmilesStep {
    type Item = String;
    type Output = Compound;

    fn label(&self) -> &'static str {
        "SMILES"
    }

    async fn classify(
        &self,
        client: &ClassyFireClient,
        item: &String,
    ) -> Result<Compound, ClassifyError> {
        client.classify_smiles(item).await
    }
}

/// Classifies every identifier cell of a table row.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowStep;

#[async_trait]
impl BatchStep for RowStep {
    type Item = Row;
    type Output = RowClassification;

    fn label(&self) -> &'static str {
        "rows"
    }

    async fn classify(
        &self,
        client: &ClassyFireClient,
        item: &Row,
    ) -> Result<RowClassification, ClassifyError> {
        client.classify_row(item).await
    }
}
