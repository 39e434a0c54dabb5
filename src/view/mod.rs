pub mod list_renderer;
pub mod post_renderer;
pub mod seo;
pub mod sitemap_renderer;
