mod app;
mod ui;

use simple_video_downloader::utils::logging::init_tracing;

fn main() -> iced::Result {
    init_tracing();

    iced::application(app::DownloadApp::default, app::update, app::view)
        .title("Simple Video Downloader")
        .run()
}
