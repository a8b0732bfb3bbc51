pub mod db;
pub mod pdf;

pub use db::PgStore;
pub use pdf::render_pdf;
