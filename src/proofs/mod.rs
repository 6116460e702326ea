pub mod analyzer;
pub mod ocr;
pub mod storage;

pub use analyzer::{AnalysisError, HsvOcrAnalyzer, ProofAnalyzer};
pub use ocr::{TesseractCli, TextRecognizer};
pub use storage::{FsImageStore, ImageStore};

#[cfg(test)]
pub use analyzer::FixedVerdict;
#[cfg(test)]
pub use storage::MemoryImageStore;
