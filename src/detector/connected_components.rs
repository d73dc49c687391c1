/// Connected components for bubble mark detection
/// Labels foreground (non-black) regions and reports the dominant blob
use image::GrayImage;
use std::collections::HashMap;

/// Union-Find data structure
pub struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    pub fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        // Path compression
        let mut node = x;
        while self.parent[node as usize] != root {
            let next = self.parent[node as usize];
            self.parent[node as usize] = root;
            node = next;
        }
        root
    }

    pub fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x != root_y {
            self.parent[root_x as usize] = root_y;
        }
    }
}

/// A connected foreground region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blob {
    /// Bounding box left edge, relative to the labelled image
    pub x: u32,
    /// Bounding box top edge
    pub y: u32,
    /// Bounding box width
    pub width: u32,
    /// Bounding box height
    pub height: u32,
    /// Number of foreground pixels in the region
    pub area: usize,
}

#[derive(Clone, Copy)]
struct Accum {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    area: usize,
    first_seen: usize,
}

/// Label 8-connected non-black regions and return them in raster order of
/// their first pixel
pub fn find_blobs(image: &GrayImage) -> Vec<Blob> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let fg = |x: usize, y: usize| image.get_pixel(x as u32, y as u32).0[0] > 0;

    let mut labels = vec![0u32; width * height];
    let mut next_label = 1u32;
    let mut uf = UnionFind::new(width * height + 1);

    // First pass: label components
    for y in 0..height {
        for x in 0..width {
            if !fg(x, y) {
                continue;
            }

            let idx = y * width + x;
            let mut neighbor_labels = [0u32; 4];
            let mut count = 0;

            // Left
            if x > 0 && fg(x - 1, y) {
                neighbor_labels[count] = labels[idx - 1];
                count += 1;
            }
            // Above
            if y > 0 && fg(x, y - 1) {
                neighbor_labels[count] = labels[idx - width];
                count += 1;
            }
            // Upper-left diagonal
            if x > 0 && y > 0 && fg(x - 1, y - 1) {
                neighbor_labels[count] = labels[idx - width - 1];
                count += 1;
            }
            // Upper-right diagonal
            if x + 1 < width && y > 0 && fg(x + 1, y - 1) {
                neighbor_labels[count] = labels[idx - width + 1];
                count += 1;
            }

            let neighbors = &neighbor_labels[..count];
            match neighbors.iter().min() {
                None => {
                    labels[idx] = next_label;
                    next_label += 1;
                }
                Some(&min_label) => {
                    labels[idx] = min_label;
                    for &l in neighbors {
                        if l != min_label {
                            uf.union(min_label, l);
                        }
                    }
                }
            }
        }
    }

    // Second pass: per-root extent and area
    let mut stats: HashMap<u32, Accum> = HashMap::new();
    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let label = labels[idx];
            if label == 0 {
                continue;
            }
            let root = uf.find(label);
            let (ux, uy) = (x as u32, y as u32);
            let entry = stats.entry(root).or_insert(Accum {
                min_x: ux,
                min_y: uy,
                max_x: ux,
                max_y: uy,
                area: 0,
                first_seen: idx,
            });
            entry.min_x = entry.min_x.min(ux);
            entry.min_y = entry.min_y.min(uy);
            entry.max_x = entry.max_x.max(ux);
            entry.max_y = entry.max_y.max(uy);
            entry.area += 1;
        }
    }

    let mut accums: Vec<Accum> = stats.into_values().collect();
    accums.sort_by_key(|a| a.first_seen);
    accums
        .into_iter()
        .map(|a| Blob {
            x: a.min_x,
            y: a.min_y,
            width: a.max_x - a.min_x + 1,
            height: a.max_y - a.min_y + 1,
            area: a.area,
        })
        .collect()
}

/// The blob with the largest area; the earliest one wins ties
pub fn largest_blob(image: &GrayImage) -> Option<Blob> {
    find_blobs(image)
        .into_iter()
        .fold(None, |best: Option<Blob>, blob| match best {
            Some(b) if b.area >= blob.area => Some(b),
            _ => Some(blob),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn paint(img: &mut GrayImage, pixels: &[(u32, u32)]) {
        for &(x, y) in pixels {
            img.put_pixel(x, y, Luma([255]));
        }
    }

    #[test]
    fn test_find_blobs() {
        let mut img = GrayImage::new(10, 10);
        // 2x2 square at (2,2)
        paint(&mut img, &[(2, 2), (3, 2), (2, 3), (3, 3)]);
        // Single pixel far away
        paint(&mut img, &[(8, 8)]);

        let blobs = find_blobs(&img);
        assert_eq!(blobs.len(), 2);
        assert_eq!(
            blobs[0],
            Blob { x: 2, y: 2, width: 2, height: 2, area: 4 }
        );
        assert_eq!(blobs[1].area, 1);
    }

    #[test]
    fn test_diagonal_pixels_connect() {
        let mut img = GrayImage::new(6, 6);
        paint(&mut img, &[(0, 0), (1, 1), (2, 2), (3, 1)]);
        let blob = largest_blob(&img).unwrap();
        assert_eq!(blob.area, 4);
        assert_eq!((blob.x, blob.y, blob.width, blob.height), (0, 0, 4, 3));
    }

    #[test]
    fn test_u_shape_merges_labels() {
        let mut img = GrayImage::new(5, 4);
        // Two arms that only join on the bottom row
        paint(&mut img, &[(0, 0), (0, 1), (0, 2), (4, 0), (4, 1), (4, 2)]);
        paint(&mut img, &[(0, 3), (1, 3), (2, 3), (3, 3), (4, 3)]);
        let blobs = find_blobs(&img);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].area, 11);
    }

    #[test]
    fn test_largest_blob() {
        let mut img = GrayImage::new(12, 4);
        paint(&mut img, &[(0, 0), (1, 0)]);
        paint(&mut img, &[(5, 1), (6, 1), (5, 2), (6, 2), (7, 2)]);
        let blob = largest_blob(&img).unwrap();
        assert_eq!(blob.area, 5);
        assert_eq!((blob.x, blob.y), (5, 1));

        assert_eq!(largest_blob(&GrayImage::new(4, 4)), None);
    }
}
