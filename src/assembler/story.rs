//! The agreement story: every block of the document, in page order.

use crate::agreement::format::format_currency;
use crate::agreement::Agreement;
use crate::pdf::{
    Align, Color, Flowable, Font, Padding, ParagraphStyle, RasterImage, Rule, Table, TableStyle,
};

use super::assets::{create_logo_placeholder, generate_qr_code};
use super::{AssemblyOptions, RenderContext};

/// Points per inch.
pub const INCH: f32 = 72.0;

pub const TITLE: &str = "CLIENT SERVICE AGREEMENT";
pub const TERMS_HEADING: &str = "TERMS AND CONDITIONS";
pub const PROVISIONS_HEADING: &str = "STANDARD PROVISIONS";
pub const QR_CAPTION: &str = "Scan QR code for verification";

/// Boilerplate printed on every agreement.
pub const STANDARD_PROVISIONS: &str = "This agreement constitutes the entire agreement between \
the parties and supersedes all prior negotiations, representations, or agreements relating to \
the subject matter herein. This agreement shall be governed by the laws of the applicable \
jurisdiction. Any modifications to this agreement must be made in writing and signed by both \
parties.";

const BRAND: Color = Color::rgb(0x1f, 0x4e, 0x79);
const KEY_SHADE: Color = Color::rgb(0xf8, 0xf9, 0xfa);
const GRID: Color = Color::rgb(0xde, 0xe2, 0xe6);
const CAPTION_GREY: Color = Color::rgb(0x66, 0x66, 0x66);

/// The laid-out blocks plus the asset failures met while building them.
#[derive(Debug, Default)]
pub struct Story {
    pub flowables: Vec<Flowable>,
    pub warnings: Vec<String>,
}

impl Story {
    fn push(&mut self, flowable: Flowable) {
        self.flowables.push(flowable);
    }

    fn spacer(&mut self, height: f32) {
        self.flowables.push(Flowable::Spacer(height));
    }

    fn warn(&mut self, warning: String) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Tables of the story, in order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.flowables.iter().filter_map(|flowable| match flowable {
            Flowable::Table(table) => Some(table),
            _ => None,
        })
    }

    pub fn image_count(&self) -> usize {
        self.flowables
            .iter()
            .filter(|flowable| matches!(flowable, Flowable::Image(_)))
            .count()
    }
}

fn title_style() -> ParagraphStyle {
    ParagraphStyle::new(Font::HelveticaBold, 24.0)
        .with_color(BRAND)
        .aligned(Align::Center)
        .spaced(0.0, 30.0)
}

fn heading_style() -> ParagraphStyle {
    ParagraphStyle::new(Font::HelveticaBold, 14.0)
        .with_color(BRAND)
        .spaced(20.0, 12.0)
}

fn body_style() -> ParagraphStyle {
    ParagraphStyle::new(Font::Helvetica, 11.0)
        .aligned(Align::Justify)
        .spaced(0.0, 12.0)
}

fn caption_style() -> ParagraphStyle {
    ParagraphStyle::new(Font::HelveticaOblique, 8.0)
        .with_color(CAPTION_GREY)
        .aligned(Align::Right)
}

fn details_style() -> TableStyle {
    let mut style = TableStyle::new(Font::HelveticaBold, Font::Helvetica, 11.0);
    style.padding = Padding::new(8.0, 12.0, 8.0, 12.0);
    style.key_background = Some(KEY_SHADE);
    style.grid = Some(Rule::new(1.0, GRID));
    style
}

fn signature_style() -> TableStyle {
    let mut style = TableStyle::new(Font::HelveticaBold, Font::Helvetica, 11.0);
    style.padding = Padding::new(8.0, 0.0, 8.0, 0.0);
    // The line to sign on, under the empty value cell of the first row.
    style.rules_below = vec![(0, 1, Rule::new(1.0, Color::BLACK))];
    style
}

/// Rows of the agreement details table.
pub fn detail_rows(agreement: &Agreement, context: &RenderContext) -> Vec<Vec<String>> {
    vec![
        vec!["Agreement Date:".to_string(), context.generated_at.clone()],
        vec!["Client Name:".to_string(), agreement.client_name.clone()],
        vec!["Client Address:".to_string(), agreement.client_address.clone()],
        vec![
            "Agreement Amount:".to_string(),
            format_currency(agreement.agreement_amount),
        ],
        vec!["Agreement ID:".to_string(), context.agreement_id.clone()],
    ]
}

/// Rows of the signature block. The signature cell is always left empty.
pub fn signature_rows(agreement: &Agreement, context: &RenderContext) -> Vec<Vec<String>> {
    vec![
        vec!["Client Signature:".to_string(), String::new()],
        vec!["Date:".to_string(), context.generated_at.clone()],
        vec!["Print Name:".to_string(), agreement.client_name.clone()],
    ]
}

/// Text encoded into the QR code.
pub fn verification_text(agreement: &Agreement, context: &RenderContext) -> String {
    format!(
        "Agreement ID: {}\nClient: {}\nAmount: {}",
        context.agreement_id,
        agreement.client_name,
        format_currency(agreement.agreement_amount)
    )
}

/// Build the full story for `agreement`.
///
/// Logo and QR code failures only drop the image and are reported through
/// [`Story::warnings`]. `agreement.signature` is not drawn.
pub fn build_story(
    agreement: &Agreement,
    context: &RenderContext,
    options: AssemblyOptions,
) -> Story {
    let mut story = Story::default();

    if options.include_logo {
        match create_logo_placeholder().and_then(|png| Ok(RasterImage::from_png(&png)?)) {
            Ok(logo) => {
                story.push(Flowable::image(logo, INCH, INCH, Align::Center));
                story.spacer(20.0);
            }
            Err(error) => story.warn(format!("Error adding logo: {}", error)),
        }
    }

    story.push(Flowable::paragraph(TITLE, title_style()));
    story.spacer(30.0);

    story.push(Flowable::Table(Table {
        rows: detail_rows(agreement, context),
        col_widths: vec![2.0 * INCH, 4.0 * INCH],
        style: details_style(),
    }));
    story.spacer(30.0);

    story.push(Flowable::paragraph(TERMS_HEADING, heading_style()));
    story.push(Flowable::paragraph(agreement.notes_terms.as_str(), body_style()));
    story.spacer(30.0);

    story.push(Flowable::paragraph(PROVISIONS_HEADING, heading_style()));
    story.push(Flowable::paragraph(STANDARD_PROVISIONS, body_style()));
    story.spacer(40.0);

    story.push(Flowable::Table(Table {
        rows: signature_rows(agreement, context),
        col_widths: vec![2.0 * INCH, 4.0 * INCH],
        style: signature_style(),
    }));
    story.spacer(30.0);

    if options.include_qr {
        let payload = verification_text(agreement, context);
        match generate_qr_code(&payload).and_then(|png| Ok(RasterImage::from_png(&png)?)) {
            Ok(qr) => {
                story.push(Flowable::image(qr, INCH, INCH, Align::Right));
                story.push(Flowable::paragraph(QR_CAPTION, caption_style()));
            }
            Err(error) => story.warn(format!("Error adding QR code: {}", error)),
        }
    }

    story
}
