use std::sync::Arc;

use crate::adapters::{
    FFmpegAdapter, FFprobeAdapter, RetryPolicy, Settings, TokioProcessAdapter, YoutubeDlAdapter,
};
use crate::app::{
    crawl_interactor::{CrawlInteractor, CrawlOptions},
    dump_frames_interactor::{DumpFramesInteractor, DumpFramesOptions},
    edit_interactor::{EditInteractor, EditOptions},
    video_info_interactor::VideoInfoInteractor,
};
use crate::ports::{FetchPort, ProbePort, ProcessPort, TransformPort};

/// Wires adapters to interactors
///
/// Every adapter shares one [`ProcessPort`], so tests can swap the whole
/// external tool layer with a single scripted runner.
pub struct AppContainer {
    probe_port: Arc<dyn ProbePort>,
    transform_port: Arc<dyn TransformPort>,
    fetch_port: Arc<dyn FetchPort>,
}

impl AppContainer {
    /// Container running the real binaries named in `settings`
    pub fn new(settings: &Settings) -> Self {
        Self::with_process(settings, Arc::new(TokioProcessAdapter::new()))
    }

    /// Container running every external program through `runner`
    pub fn with_process(settings: &Settings, runner: Arc<dyn ProcessPort>) -> Self {
        let tools = &settings.tools;
        let probe_port = Arc::new(FFprobeAdapter::new(Arc::clone(&runner), &tools.ffprobe));
        let transform_port = Arc::new(FFmpegAdapter::new(Arc::clone(&runner), &tools.ffmpeg));
        let fetch_port = Arc::new(YoutubeDlAdapter::new(
            Arc::clone(&runner),
            &tools.youtube_dl,
            &settings.fetch.url_base,
            RetryPolicy::from(&settings.fetch),
        ));

        Self {
            probe_port,
            transform_port,
            fetch_port,
        }
    }

    pub fn dump_frames_interactor(&self, options: DumpFramesOptions) -> Arc<DumpFramesInteractor> {
        Arc::new(DumpFramesInteractor::new(
            Arc::clone(&self.transform_port),
            Arc::clone(&self.probe_port),
            options,
        ))
    }

    pub fn video_info_interactor(&self, root: Option<std::path::PathBuf>) -> VideoInfoInteractor {
        VideoInfoInteractor::new(Arc::clone(&self.probe_port), root)
    }

    pub fn edit_interactor(&self, options: EditOptions) -> Arc<EditInteractor> {
        Arc::new(EditInteractor::new(Arc::clone(&self.transform_port), options))
    }

    pub fn crawl_interactor(&self, options: CrawlOptions) -> Arc<CrawlInteractor> {
        Arc::new(CrawlInteractor::new(
            Arc::clone(&self.fetch_port),
            Arc::clone(&self.transform_port),
            options,
        ))
    }
}
