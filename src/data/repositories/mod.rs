pub mod review_item;

pub use review_item::ReviewItemRepository;
