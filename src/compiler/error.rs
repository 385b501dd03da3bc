use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum Error {
    #[snafu(display("Executable '{}' has no source file(s) to build.", name))]
    NoSources { name: String },

    #[snafu(display("Shared libraries are not implemented by the '{}' compiler adapter.", compiler))]
    SharedLibraryUnsupported { compiler: String },

    #[snafu(display("Can only build executables and libraries (entity '{}').", name))]
    UnsupportedEntityKind { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;
