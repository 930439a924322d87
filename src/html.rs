// ABOUTME: HTML generation module for the clickcast build
// ABOUTME: Produces the playback state blob, the canvas stylesheet and the self-contained index page

use crate::errors::{CastError, Result};
use crate::model::Presentation;
use log::info;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Id of the script element holding the inlined state.
pub const STATE_ELEMENT_ID: &str = "dahu-presentation";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaybackState<'a> {
    meta_data: MetaData,
    slides: Vec<PlaybackSlide<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetaData {
    image_width: u32,
    image_height: u32,
    nb_slide: usize,
}

#[derive(Serialize)]
struct PlaybackSlide<'a> {
    id: &'a str,
    img: String,
    actions: Vec<PlaybackAction>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaybackAction {
    #[serde(rename = "type")]
    kind: &'static str,
    target: &'static str,
    final_abs: f64,
    final_ord: f64,
    speed: f64,
}

/// Serialize the presentation in the shape the playback engine reads.
///
/// `image_size` is the size of the images actually written to the build.
pub fn generate_state_json(
    presentation: &Presentation,
    image_dir_name: &str,
    image_size: (u32, u32),
) -> Result<String> {
    let state = PlaybackState {
        meta_data: MetaData {
            image_width: image_size.0,
            image_height: image_size.1,
            nb_slide: presentation.slides.len(),
        },
        slides: presentation
            .slides
            .iter()
            .map(|slide| PlaybackSlide {
                id: &slide.id,
                img: format!("{}/{}", image_dir_name, slide.image_file_name()),
                actions: slide
                    .actions
                    .iter()
                    .map(|a| PlaybackAction {
                        kind: "move",
                        target: a.target.as_str(),
                        final_abs: a.final_abs,
                        final_ord: a.final_ord,
                        speed: a.speed,
                    })
                    .collect(),
            })
            .collect(),
    };
    Ok(serde_json::to_string(&state)?)
}

/// Stylesheet sizing the playback canvas.
pub fn generate_css(image_size: (u32, u32)) -> String {
    let (width, height) = image_size;
    format!(
        ".dahu-screen {{\n    position: relative;\n    width: {w}px;\n    height: {h}px;\n    \
         margin: 0 auto;\n    overflow: hidden;\n}}\n\
         .dahu-slide {{\n    position: absolute;\n    top: 0;\n    left: 0;\n    \
         width: {w}px;\n    height: {h}px;\n}}\n\
         .dahu-cursor {{\n    position: absolute;\n    z-index: 10;\n}}\n",
        w = width,
        h = height
    )
}

/// Build the index page with the stylesheet and state inlined.
pub fn generate_html(state_json: &str, css: &str) -> String {
    let mut html_doc = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html_doc.push_str("<meta charset=\"UTF-8\">\n");
    html_doc.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html_doc.push_str("<title>Dahu presentation</title>\n");
    html_doc.push_str("<link rel=\"stylesheet\" href=\"dahuapp.viewer.css\">\n");
    html_doc.push_str(&format!("<style>\n{}</style>\n", css));
    html_doc.push_str("</head>\n<body>\n");
    html_doc.push_str("<div class=\"dahu-screen\" id=\"dahu-screen\"></div>\n");

    // "</" inside the blob would end the script element early
    html_doc.push_str(&format!(
        "<script id=\"{}\" type=\"application/json\">{}</script>\n",
        STATE_ELEMENT_ID,
        state_json.replace("</", "<\\/")
    ));

    for script in ["dahuapp.js", "parse-search.js", "dahuapp.viewer.js"] {
        html_doc.push_str(&format!("<script src=\"{}\"></script>\n", script));
    }
    html_doc.push_str("</body>\n</html>\n");
    html_doc
}

/// The inlined state blob of a generated page, as JSON text.
pub fn inlined_state(html: &str) -> Option<&str> {
    let open = format!("<script id=\"{}\" type=\"application/json\">", STATE_ELEMENT_ID);
    let start = html.find(&open)? + open.len();
    let end = html[start..].find("</script>")? + start;
    Some(&html[start..end])
}

/// Utility function to write HTML content to a file
pub fn write_html_to_file(html_content: &str, output_path: &Path) -> Result<()> {
    info!("Writing HTML to file: {:?}", output_path);
    fs::write(output_path, html_content).map_err(|e| CastError::io(output_path, e))
}
