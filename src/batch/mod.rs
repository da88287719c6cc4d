//! Batch classification over identifier lists, table rows and delimited files.
//!
//! Every entry point returns a lazy [`ClassificationBatch`]; nothing is
//! requested until the batch is pulled.
//!
//! # Example
//!
//! ```no_run
//! use classyfire::{ClassyFireClient, ClientConfig};
//!
//! # async fn example() -> Result<(), classyfire::ClassifyError> {
//! let client = ClassyFireClient::new(ClientConfig::default())?;
//! let mut batch = client.classify_inchikeys([
//!     "BSYNRYMUTXBXSQ-UHFFFAOYSA-N",
//!     "YQEZLKZALYSWHR-UHFFFAOYSA-N",
//! ]);
//! while let Some(compound) = batch.next().await {
//!     println!("{}", compound?.short_summary());
//! }
//! # Ok(())
//! # }
//! ```

mod orchestrator;
mod steps;
mod table;

use std::path::Path;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::classify::{ClassifyError, ClassyFireClient};
use crate::identifier::is_valid_inchikey;

pub use orchestrator::ClassificationBatch;
pub use steps::{BatchStep, InchikeyStep, RowStep, SmilesStep};
pub use table::{
    Row, RowClassification, TABLE_EXTENSIONS, TableError, TableReader, is_table_path, parse_cell,
    parse_separator, read_table, separator_for_path,
};

impl ClassyFireClient {
    /// Classifies a sequence of InChIKeys lazily.
    pub fn classify_inchikeys<'a, I>(&'a self, inchikeys: I) -> ClassificationBatch<'a, InchikeyStep>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        I::IntoIter: Send + 'a,
    {
        ClassificationBatch::new(
            self,
            InchikeyStep,
            inchikeys.into_iter().map(|inchikey| Ok(inchikey.into())),
        )
    }

    /// Classifies a sequence of SMILES strings lazily.
    pub fn classify_smiles_list<'a, I>(&'a self, smiles: I) -> ClassificationBatch<'a, SmilesStep>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        I::IntoIter: Send + 'a,
    {
        ClassificationBatch::new(
            self,
            SmilesStep,
            smiles.into_iter().map(|smiles| Ok(smiles.into())),
        )
    }

    /// Classifies table rows lazily; each row yields a `column -> Compound` map.
    pub fn classify_rows<'a, I>(&'a self, rows: I) -> ClassificationBatch<'a, RowStep>
    where
        I: IntoIterator<Item = Row>,
        I::IntoIter: Send + 'a,
    {
        ClassificationBatch::new(self, RowStep, rows.into_iter().map(Ok))
    }

    /// Classifies the rows of a delimited file lazily, reading one row per pull.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::Table`] when the file cannot be opened. Read
    /// errors on later rows end the batch with the same variant.
    pub fn classify_csv(
        &self,
        path: impl AsRef<Path>,
        separator: u8,
        header: bool,
    ) -> Result<ClassificationBatch<'_, RowStep>, ClassifyError> {
        let reader = TableReader::open(path, separator, header)
            .map_err(|source| ClassifyError::Table { source })?;
        Ok(ClassificationBatch::new(
            self,
            RowStep,
            reader.map(|row| row.map_err(|source| ClassifyError::Table { source })),
        ))
    }

    /// Classifies every identifier cell of one row.
    ///
    /// String cells holding a valid InChIKey are classified directly; other
    /// string cells are tried as SMILES and skipped when the converter rejects
    /// them. Non-string cells are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first error other than a SMILES rejection.
    #[instrument(skip(self, row), fields(columns = row.len()))]
    pub async fn classify_row(&self, row: &Row) -> Result<RowClassification, ClassifyError> {
        let mut classified = RowClassification::new();
        for (column, cell) in row {
            let Value::String(candidate) = cell else {
                continue;
            };

            let compound = if is_valid_inchikey(candidate) {
                self.classify_inchikey(candidate).await?
            } else {
                match self.classify_smiles(candidate).await {
                    Ok(compound) => compound,
                    Err(ClassifyError::InvalidSmiles { reason, .. }) => {
                        debug!(column, reason, "cell is not an identifier");
                        continue;
                    }
                    Err(error) => return Err(error),
                }
            };
            classified.insert(column.clone(), compound);
        }
        Ok(classified)
    }
}
