/// STL file parser for binary and ASCII formats
use nalgebra::{Point3, Vector2, Vector3};
use nom::{
    bytes::complete::{tag, take_till},
    character::complete::{multispace0, multispace1},
    multi::many0,
    number::complete::float,
    sequence::preceded,
    IResult,
};

use crate::error::{Error, Result};
use crate::geometry::{face_normal, Mesh, Vertex};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Facet normal and its three corners, as read from the file
type Facet = ([f32; 3], [[f32; 3]; 3]);

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh> {
    if data.len() < HEADER_LEN + 4 {
        return Err(Error::parse(0, "file too small to be a valid STL"));
    }

    let data = &data[HEADER_LEN..];
    let triangle_count = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let body = &data[4..];

    if body.len() < triangle_count * FACET_LEN {
        return Err(Error::parse(
            0,
            format!("expected {} triangles, file ends early", triangle_count),
        ));
    }

    let read_f32 = |bytes: &[u8]| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let read_vec3 = |bytes: &[u8]| {
        [read_f32(&bytes[0..]), read_f32(&bytes[4..]), read_f32(&bytes[8..])]
    };

    let facets = body
        .chunks_exact(FACET_LEN)
        .take(triangle_count)
        .map(|facet| {
            // normal, 3 vertices, then a 2-byte attribute count we ignore
            let normal = read_vec3(&facet[0..12]);
            let corners = [
                read_vec3(&facet[12..24]),
                read_vec3(&facet[24..36]),
                read_vec3(&facet[36..48]),
            ];
            (normal, corners)
        });

    Ok(build_mesh(facets, triangle_count))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh> {
    match parse_ascii_stl_impl(input) {
        Ok((_, facets)) => {
            let count = facets.len();
            Ok(build_mesh(facets.into_iter(), count))
        }
        Err(e) => Err(Error::parse(0, format!("failed to parse ASCII STL: {:?}", e))),
    }
}

/// Every facet becomes three unshared vertices. Facets with a zero normal
/// get one from their winding order.
fn build_mesh(facets: impl Iterator<Item = Facet>, capacity: usize) -> Mesh {
    let mut mesh = Mesh::with_capacity(capacity * 3, capacity);
    for (normal, corners) in facets {
        let [a, b, c] = corners.map(|[x, y, z]| Point3::new(x, y, z));
        let stored: Vector3<f32> = Vector3::from(normal);
        let normal = stored
            .try_normalize(f32::EPSILON)
            .or_else(|| face_normal(&a, &b, &c).try_normalize(f32::EPSILON))
            .unwrap_or_else(Vector3::z);

        let face = [a, b, c].map(|p| mesh.add_vertex(Vertex::new(p, normal, Vector2::zeros())));
        mesh.add_face(face);
    }
    mesh
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Vec<Facet>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    // Optional name, up to the end of the line
    let (input, _) = take_till(|c: char| c == '\n')(input)?;
    let (input, facets) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    Ok((input, facets))
}

fn parse_facet(input: &str) -> IResult<&str, Facet> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input)?;
    let (input, v2) = parse_vertex(input)?;
    let (input, v3) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, (normal, [v1, v2, v3])))
}

fn parse_vertex(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    parse_vector3(input)
}

fn parse_vector3(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, [x, y, z]))
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh> {
    // Binary files may also start with "solid", so fall back on failure
    if data.len() > 5 && &data[0..5] == b"solid" {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let mesh = parse_binary_stl(&data).unwrap();
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_parse_binary_facet() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&1u32.to_le_bytes());
        // Zero normal, so it is recomputed from the winding
        let floats = [0.0f32, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        for f in floats {
            data.extend_from_slice(&f.to_le_bytes());
        }
        data.extend_from_slice(&[0, 0]);

        let mesh = parse_binary_stl(&data).unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.position(0, 1), Point3::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.normal(0, 0), Vector3::z());
    }

    #[test]
    fn test_truncated_binary() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 50]);
        assert!(parse_binary_stl(&data).is_err());
    }

    #[test]
    fn test_parse_ascii() {
        let src = "solid tri
  facet normal 0 0 -1
    outer loop
      vertex 0 0 0
      vertex 0 1 0
      vertex 1 0 0
    endloop
  endfacet
endsolid tri
";
        let mesh = parse_stl(src.as_bytes()).unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.normal(0, 2), Vector3::new(0.0, 0.0, -1.0));
    }
}
