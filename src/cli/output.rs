//! Terminal output shared by commands.

use console::style;

use crate::error::RetrievalError;
use crate::extract::VideoReference;

pub fn print_videos(url: &str, videos: &[VideoReference]) {
    if videos.is_empty() {
        println!("{} No videos found on {}", style("!").yellow(), url);
        return;
    }

    println!(
        "{} Found {} video(s) on {}",
        style("✓").green(),
        videos.len(),
        url
    );
    for video in videos {
        println!(
            "  {} {} {}",
            style("→").cyan(),
            video.url,
            style(video.kind.as_str()).dim()
        );

        let details: Vec<String> = [
            video.title.as_ref().map(|t| format!("title: {}", t)),
            video.quality.as_ref().map(|q| format!("quality: {}", q)),
            video.format.as_ref().map(|f| format!("format: {}", f)),
            video.duration.as_ref().map(|d| format!("duration: {}", d)),
            video.poster.as_ref().map(|p| format!("poster: {}", p)),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !details.is_empty() {
            println!("    {}", style(details.join(", ")).dim());
        }
    }
}

pub fn print_videos_json(url: &str, videos: &[VideoReference]) -> anyhow::Result<()> {
    let out = serde_json::json!({
        "url": url,
        "count": videos.len(),
        "videos": videos,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

pub fn print_retrieval_failure(url: &str, err: &RetrievalError) {
    eprintln!("{} Could not fetch {}", style("✗").red(), url);
    for attempt in err.attempts() {
        eprintln!("  {} {}", style("→").dim(), attempt);
    }
}
