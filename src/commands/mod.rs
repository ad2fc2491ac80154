mod collect;
mod profile;

pub use collect::collect;
pub use profile::profile;
