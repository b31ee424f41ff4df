pub mod capture;
pub mod sync;
pub mod math;
pub mod settings;

pub use bytemuck;
pub use rustc_hash;

mod util;

pub use util::INVALID_ID;

pub use capture::CaptureCtx;
pub use settings::Settings;
