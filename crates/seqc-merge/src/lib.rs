//! seqc-merge: fusiona las tablas por muestra de un experimento.
//!
//! Cada archivo de entrada es un CSV con una columna identificadora de
//! célula seguida de columnas de features. El resultado conserva la
//! procedencia de cada fila mediante la clave `(sample_number, cell_id)`.
pub mod merger;
pub mod table;

pub use merger::{merge, MergeOptions, MergeReport, RemovalFailure, DEFAULT_MERGED_NAME};
pub use table::{MergedRow, MergedTable, SampleRow, SampleTable, CELL_ID_COLUMN, SAMPLE_NUMBER_COLUMN};
