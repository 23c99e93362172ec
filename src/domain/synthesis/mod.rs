pub mod context;
pub mod dto;
pub mod error;
pub mod invoker;
pub mod model;
pub mod service;

pub use context::{Phase, RequestContext};
pub use dto::SynthesizeBody;
pub use error::SynthesisError;
pub use invoker::SynthesisInvoker;
pub use model::{
    CanonicalAudio, DecodingParams, FetchedAsset, InferenceMode, SynthesisRequest,
    SynthesisResult, SynthesizedAudio,
};
pub use service::{SynthesisService, SynthesisServiceApi};
