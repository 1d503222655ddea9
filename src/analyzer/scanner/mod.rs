pub mod artistignore;
pub mod harvester;

pub use artistignore::load_artistignore;
pub use harvester::Harvester;
