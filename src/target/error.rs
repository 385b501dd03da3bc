use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum Error {
    #[snafu(display("unknown target platform '{}'", name))]
    UnknownPlatform { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;
