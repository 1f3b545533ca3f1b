// Application layer - Use case interactors

pub mod batch;
pub mod container;
pub mod crawl_interactor;
pub mod dump_frames_interactor;
pub mod edit_interactor;
pub mod frame_list_interactor;
pub mod log_check_interactor;
pub mod video_info_interactor;

// Re-export interactors
pub use batch::{BatchRunner, BatchTask, CancelHandle};
pub use container::AppContainer;
pub use crawl_interactor::CrawlInteractor;
pub use dump_frames_interactor::DumpFramesInteractor;
pub use edit_interactor::EditInteractor;
pub use frame_list_interactor::FrameListInteractor;
pub use log_check_interactor::LogCheckInteractor;
pub use video_info_interactor::VideoInfoInteractor;
