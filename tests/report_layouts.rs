//! Peak tables on pages assembled by hand with `lopdf`, covering layouts the
//! sample generator never produces.

use std::path::Path;

use lopdf::{dictionary, Document, Object, Stream};
use rusty_extraktor::data::model::ExtractedFile;
use rusty_extraktor::data::pdf::PdfPeakExtractor;
use rusty_extraktor::error::{ExtractError, Result};

const COLUMNS: [i32; 5] = [60, 130, 210, 290, 370];
const SEPARATORS: [i32; 6] = [50, 120, 200, 280, 360, 450];
const ROW: i32 = 14;

const CAPTION: [&str; 5] = ["<Peak Table>", "", "", "", ""];
const DETECTOR: [&str; 5] = ["Detector A 254nm", "", "", "", ""];
const HEADER: [&str; 5] = ["Peak#", "Ret. Time", "Area", "Height", "Area%"];
const PEAK_1: [&str; 5] = ["1", "1.254", "51234", "4012", "60.109"];
const PEAK_2: [&str; 5] = ["2", "3.871", "34001", "2710", "39.891"];
const TOTAL: [&str; 5] = ["Total", "", "85235", "6722", "100.000"];

fn full_table() -> Vec<[&'static str; 5]> {
    vec![CAPTION, DETECTOR, HEADER, PEAK_1, PEAK_2, TOTAL]
}

fn text_op(x: i32, y: i32, cell: &str) -> String {
    // Cells written as `[...]` go out as TJ arrays with kerning.
    if cell.starts_with('[') {
        format!("BT /F1 9 Tf {x} {y} Td {cell} TJ ET\n")
    } else {
        format!("BT /F1 9 Tf {x} {y} Td ({cell}) Tj ET\n")
    }
}

fn cell_text(top: i32, rows: &[[&str; 5]]) -> String {
    let mut ops = String::new();
    for (i, row) in rows.iter().enumerate() {
        let y = top - 9 - ROW * i as i32;
        for (x, cell) in COLUMNS.iter().zip(row) {
            if !cell.is_empty() {
                ops.push_str(&text_op(*x, y, cell));
            }
        }
    }
    ops
}

/// Rows with rules between them and every column separator, stroked as
/// single line segments.
fn ruled_table(top: i32, rows: &[[&str; 5]]) -> String {
    let bottom = top - ROW * rows.len() as i32;
    let mut ops = String::from("0.5 w\n");
    for i in 0..=rows.len() as i32 {
        let y = top - ROW * i;
        ops.push_str(&format!("50 {y} m 450 {y} l\n"));
    }
    for x in SEPARATORS {
        ops.push_str(&format!("{x} {bottom} m {x} {top} l\n"));
    }
    ops.push_str("S\n");
    ops + &cell_text(top, rows)
}

/// Same grid, but every cell is its own stroked rectangle.
fn boxed_table(top: i32, rows: &[[&str; 5]]) -> String {
    let mut ops = String::from("0.5 w\n");
    for i in 0..rows.len() as i32 {
        let y = top - ROW * (i + 1);
        for pair in SEPARATORS.windows(2) {
            ops.push_str(&format!("{} {y} {} {ROW} re\n", pair[0], pair[1] - pair[0]));
        }
    }
    ops.push_str("S\n");
    ops + &cell_text(top, rows)
}

fn title_block() -> String {
    [
        text_op(60, 780, "Analysis Report"),
        text_op(60, 760, "Sample Name: hand-made"),
    ]
    .concat()
}

/// One-page document whose page runs `content`, with optional Form
/// XObjects registered under their names.
fn one_page_pdf(content: &str, forms: &[(&str, String)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut xobjects = lopdf::Dictionary::new();
    for (name, body) in forms {
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            },
            body.as_bytes().to_vec(),
        );
        xobjects.set(*name, doc.add_object(form));
    }

    let content_id = doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => xobjects,
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

fn extract(bytes: &[u8]) -> Result<ExtractedFile> {
    PdfPeakExtractor::default().extract_bytes(bytes, Path::new("hand-made.pdf"))
}

fn assert_two_peaks(file: &ExtractedFile) {
    assert_eq!(file.len(), 2, "rows: {:?}", file.rows);
    assert_eq!(file.rows[0].retention_time, 1.254);
    assert_eq!(file.rows[0].area, 51234);
    assert_eq!(file.rows[0].area_percent, 60.109);
    assert_eq!(file.rows[1].retention_time, 3.871);
    assert_eq!(file.rows[1].area_percent, 39.891);
}

#[test]
fn table_drawn_inside_a_form_xobject() {
    let form = title_block() + &ruled_table(600, &full_table());
    let pdf = one_page_pdf("q /Fm0 Do Q", &[("Fm0", form)]);
    assert_two_peaks(&extract(&pdf).unwrap());
}

#[test]
fn chromatogram_frame_above_the_table_is_ignored() {
    let chromatogram = "\
        1 w\n\
        50 615 400 120 re S\n\
        50 620 m 100 640 l 110 720 l 120 625 l 200 622 l 210 690 l 220 621 l 450 624 l S\n";
    let labels = text_op(30, 725, "mV") + &text_op(440, 605, "min");
    let content = title_block() + chromatogram + &labels + &ruled_table(600, &full_table());
    let pdf = one_page_pdf(&content, &[]);
    assert_two_peaks(&extract(&pdf).unwrap());
}

#[test]
fn cells_stroked_as_separate_rectangles() {
    let content = title_block() + &boxed_table(600, &full_table());
    assert_two_peaks(&extract(&one_page_pdf(&content, &[])).unwrap());
}

#[test]
fn caption_printed_above_the_ruled_box() {
    // Only header, peaks and total are ruled; the caption and detector
    // lines sit above the box as plain text.
    let content = title_block()
        + &text_op(60, 620, "<Peak Table>")
        + &text_op(60, 606, "Detector A 254nm")
        + &ruled_table(600, &[HEADER, PEAK_1, PEAK_2, TOTAL]);
    assert_two_peaks(&extract(&one_page_pdf(&content, &[])).unwrap());
}

#[test]
fn kerned_numbers_are_joined() {
    let kerned = ["1", "[(1.2) -15 (54)]", "[(512) -10 (34)]", "4012", "60.109"];
    let rows = [CAPTION, DETECTOR, HEADER, kerned, PEAK_2, TOTAL];
    let content = title_block() + &ruled_table(600, &rows);
    assert_two_peaks(&extract(&one_page_pdf(&content, &[])).unwrap());
}

#[test]
fn ruled_box_without_peak_header_is_malformed() {
    let instrument = [
        ["Instrument", "LC-2030", "", "", ""],
        ["Column", "C18", "", "", ""],
        ["Flow", "1.0", "", "", ""],
    ];
    let content = title_block() + &ruled_table(600, &instrument);
    let err = extract(&one_page_pdf(&content, &[])).unwrap_err();
    assert!(matches!(err, ExtractError::MalformedDocument { .. }), "{err}");
}
