use thiserror::Error;

pub type RaceResult<T> = Result<T, RaceError>;

#[derive(Debug, Error)]
pub enum RaceError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("no frames to play: every record was dropped or the input was empty")]
    NoData,

    #[error("renderer failed: {0}")]
    Render(String),
}
