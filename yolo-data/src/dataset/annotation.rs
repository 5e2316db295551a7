use super::AnnotationRecord;
use crate::common::*;

/// The parser of YOLO text annotations.
///
/// Every non-blank line of an annotation file reads
/// `<class_id> <x_center> <y_center> <width> <height>`, where the geometry is normalized to
/// the image size. Fields after the fifth are ignored. Blank lines are skipped, so a file with
/// a single empty line describes an image without objects.
#[derive(Debug, Clone, Default)]
pub struct AnnotationParser {
    class_names: Option<Arc<IndexSet<String>>>,
    clamp_boxes: bool,
}

impl AnnotationParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject class ids that have no entry in `class_names`.
    pub fn class_names(self, class_names: impl Into<Arc<IndexSet<String>>>) -> Self {
        Self {
            class_names: Some(class_names.into()),
            ..self
        }
    }

    /// Clip boxes to the image, dropping boxes that end up empty.
    pub fn clamp_boxes(self, clamp_boxes: bool) -> Self {
        Self {
            clamp_boxes,
            ..self
        }
    }

    /// Parse the annotation file of an image.
    ///
    /// The image size is read from the image header without decoding pixels.
    pub fn parse(
        &self,
        image_path: impl AsRef<Path>,
        annotation_path: impl AsRef<Path>,
    ) -> Result<AnnotationRecord> {
        let image_path = image_path.as_ref();
        let annotation_path = annotation_path.as_ref();

        let size = image_size(image_path)?;
        let text = fs::read_to_string(annotation_path).map_err(|source| Error::Io {
            path: annotation_path.to_owned(),
            source,
        })?;
        let (classes, boxes) = self.parse_text(&text, &size, annotation_path)?;

        AnnotationRecord::new(image_path, size, classes, boxes)
    }

    /// Parse annotation text for an image of `size`.
    ///
    /// `source` only names the annotation in error messages.
    pub fn parse_text(
        &self,
        text: &str,
        size: &HW<usize>,
        source: &Path,
    ) -> Result<(Vec<u32>, Vec<Corners<f32>>)> {
        let image_size: HW<f64> = size.cast();
        let bounds = HW::from_hw([image_size.h() as f32, image_size.w() as f32]);
        let mut num_out_of_bound = 0;
        let mut num_dropped = 0;

        let mut classes = vec![];
        let mut boxes = vec![];

        for (line_index, line) in text.lines().enumerate() {
            let line_no = line_index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let (class, rect) = parse_line(line).map_err(|reason| Error::parse(source, line_no, reason))?;

            if let Some(class_names) = &self.class_names {
                if class as usize >= class_names.len() {
                    return Err(Error::parse(
                        source,
                        line_no,
                        format!(
                            "class id {} is out of range for {} classes",
                            class,
                            class_names.len()
                        ),
                    ));
                }
            }

            let corners: Corners<f32> = rect.to_pixel_corners(&image_size).cast();
            let inside = corners.l() >= 0.0
                && corners.t() >= 0.0
                && corners.r() <= bounds.w()
                && corners.b() <= bounds.h();

            let corners = if inside {
                corners
            } else {
                num_out_of_bound += 1;
                if self.clamp_boxes {
                    match corners.clip_to(&bounds) {
                        Some(clipped) => clipped,
                        None => {
                            num_dropped += 1;
                            continue;
                        }
                    }
                } else {
                    corners
                }
            };

            classes.push(class);
            boxes.push(corners);
        }

        if num_out_of_bound > 0 {
            if self.clamp_boxes {
                warn!(
                    "clamped {} out-of-bound boxes in '{}', {} of them dropped",
                    num_out_of_bound,
                    source.display(),
                    num_dropped
                );
            } else {
                warn!(
                    "{} boxes exceed the image in '{}'",
                    num_out_of_bound,
                    source.display()
                );
            }
        }

        Ok((classes, boxes))
    }
}

/// Read the (height, width) of an image from its header.
pub fn image_size(path: impl AsRef<Path>) -> Result<HW<usize>> {
    let path = path.as_ref();
    let imagesize::ImageSize { height, width } =
        imagesize::size(path).map_err(|err| Error::decode(path, format!("{:?}", err)))?;
    if height == 0 || width == 0 {
        return Err(Error::decode(path, "image has zero height or width"));
    }
    Ok(HW::from_hw([height, width]))
}

fn parse_line(line: &str) -> Result<(u32, CxCyWH<f64>), String> {
    let fields: Vec<_> = line.split_whitespace().collect();
    let [class, cx, cy, w, h] = match fields.as_slice() {
        &[class, cx, cy, w, h, ..] => [class, cx, cy, w, h],
        fields => {
            return Err(format!(
                "expect at least 5 fields '<class_id> <x_center> <y_center> <width> <height>', but get {}",
                fields.len()
            ))
        }
    };

    let class: u32 = class
        .parse()
        .map_err(|_| format!("class id '{}' is not a non-negative integer", class))?;

    let parse_value = |name: &str, text: &str| -> Result<f64, String> {
        let value: f64 = text
            .parse()
            .map_err(|_| format!("{} '{}' is not a number", name, text))?;
        if !value.is_finite() {
            return Err(format!("{} '{}' is not finite", name, text));
        }
        Ok(value)
    };
    let cx = parse_value("x_center", cx)?;
    let cy = parse_value("y_center", cy)?;
    let w = parse_value("width", w)?;
    let h = parse_value("height", h)?;

    let rect = CxCyWH::try_from_cxcywh([cx, cy, w, h]).map_err(|err| err.to_string())?;
    Ok((class, rect))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, hw: [usize; 2]) -> Result<(Vec<u32>, Vec<Corners<f32>>)> {
        AnnotationParser::new().parse_text(text, &HW::from_hw(hw), Path::new("test.txt"))
    }

    #[test]
    fn parse_single_box() {
        let (classes, boxes) = parse("0 0.5 0.5 0.2 0.2", [640, 640]).unwrap();
        assert_eq!(classes, [0]);
        assert_eq!(boxes[0].xyxy(), [256.0, 256.0, 384.0, 384.0]);
    }

    #[test]
    fn parse_uses_rows_as_height() {
        // 100 rows by 200 columns
        let (_, boxes) = parse("3 0.5 0.5 0.5 0.5", [100, 200]).unwrap();
        assert_eq!(boxes[0].xyxy(), [50.0, 25.0, 150.0, 75.0]);
    }

    #[test]
    fn parse_empty_annotation() {
        let (classes, boxes) = parse("\n", [640, 640]).unwrap();
        assert!(classes.is_empty());
        assert!(boxes.is_empty());

        let (classes, boxes) = parse("", [640, 640]).unwrap();
        assert!(classes.is_empty());
        assert!(boxes.is_empty());
    }

    #[test]
    fn parse_multiple_lines() {
        let text = "0 0.25 0.25 0.1 0.1\n1 0.75 0.75 0.2 0.1\n\n";
        let (classes, boxes) = parse(text, [100, 100]).unwrap();
        assert_eq!(classes, [0, 1]);
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[1].xyxy(), [65.0, 70.0, 85.0, 80.0]);
    }

    #[test]
    fn parse_rejects_short_line() {
        let err = parse("0 0.5 0.5 0.2", [640, 640]).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn parse_ignores_trailing_fields() {
        let (classes, boxes) = parse("0 0.5 0.5 0.2 0.2 0.9", [640, 640]).unwrap();
        assert_eq!(classes, [0]);
        assert_eq!(boxes[0].xyxy(), [256.0, 256.0, 384.0, 384.0]);
    }

    #[test]
    fn parse_rejects_bad_class_id() {
        let err = parse("0 0.5 0.5 0.2 0.2\nacne 0.5 0.5 0.2 0.2", [640, 640]).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));

        let err = parse("1.5 0.5 0.5 0.2 0.2", [640, 640]).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn parse_rejects_bad_geometry() {
        assert!(parse("0 0.5 zero 0.2 0.2", [640, 640]).is_err());
        assert!(parse("0 0.5 0.5 NaN 0.2", [640, 640]).is_err());
        assert!(parse("0 0.5 0.5 -0.2 0.2", [640, 640]).is_err());
    }

    #[test]
    fn parse_checks_class_names() {
        let names: IndexSet<String> = ["acne".to_string()].into_iter().collect();
        let parser = AnnotationParser::new().class_names(names);
        let size = HW::from_hw([10, 10]);

        assert!(parser
            .parse_text("0 0.5 0.5 0.2 0.2", &size, Path::new("a.txt"))
            .is_ok());
        assert!(matches!(
            parser.parse_text("1 0.5 0.5 0.2 0.2", &size, Path::new("a.txt")),
            Err(Error::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn parse_out_of_bound_boxes() {
        let text = "0 0.95 0.5 0.2 0.2\n0 1.5 0.5 0.2 0.2";

        let (classes, boxes) = parse(text, [100, 100]).unwrap();
        assert_eq!(classes.len(), 2);
        assert_eq!(boxes[0].xyxy(), [85.0, 40.0, 105.0, 60.0]);

        let parser = AnnotationParser::new().clamp_boxes(true);
        let (classes, boxes) = parser
            .parse_text(text, &HW::from_hw([100, 100]), Path::new("a.txt"))
            .unwrap();
        assert_eq!(classes, [0]);
        assert_eq!(boxes[0].xyxy(), [85.0, 40.0, 100.0, 60.0]);
    }
}
