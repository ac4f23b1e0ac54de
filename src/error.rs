use derive_more::{Display, Error};
use e621_dataset::Dataset;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("unable to locate the database exports")]
    Exports,
    /// Neither an explicit path nor the dump directory provided the export.
    #[display("no {_0} export available")]
    MissingExport(#[error(not(source))] Dataset),
    #[display("unable to load the {_0} export")]
    Index(#[error(not(source))] Dataset),
    #[display("unable to write results")]
    Output,
    #[display("background task failed")]
    Task,
}
