
use crate::error::{Error, Result};
use crate::vocab::Vocabulary;

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};


/// Bytes per sparse record: i32 x, i32 y, f32 value, all big-endian.
pub const RECORD_LEN: usize = 12;


#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub x: u32,
    pub y: u32,
    pub value: f32,
}

/// Upper triangle entries of one matrix, `x <= y`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseMatrix {
    entries: Vec<Entry>,
}

impl SparseMatrix {

    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.entries.len() * RECORD_LEN);
        for entry in &self.entries {
            buf.extend_from_slice(&(entry.x as i32).to_be_bytes());
            buf.extend_from_slice(&(entry.y as i32).to_be_bytes());
            buf.extend_from_slice(&entry.value.to_be_bytes());
        }
        buf
    }

    /// Reads records until the end of `bytes`. `source` only names the file in the error.
    pub fn decode(bytes: &[u8], source: &Path) -> Result<Self> {

        if bytes.len() % RECORD_LEN != 0 {
            return Err(Error::CorruptMatrix { path: source.to_path_buf(), len: bytes.len(), record: RECORD_LEN });
        }

        let mut entries = Vec::with_capacity(bytes.len() / RECORD_LEN);
        for record in bytes.chunks_exact(RECORD_LEN) {
            let x = i32::from_be_bytes([record[0], record[1], record[2], record[3]]);
            let y = i32::from_be_bytes([record[4], record[5], record[6], record[7]]);
            let value = f32::from_be_bytes([record[8], record[9], record[10], record[11]]);
            if x < 0 || y < 0 {
                return Err(Error::parse(format!("negative index ({}, {}) in {:?}", x, y, source)));
            }
            entries.push(Entry { x: x as u32, y: y as u32, value });
        }
        Ok(Self { entries })
    }

    /// Mirrors every entry into a `dimension x dimension` matrix.
    pub fn to_dense(&self, dimension: usize) -> Result<Array2<f32>> {

        let mut output = Array2::<f32>::zeros((dimension, dimension));
        for entry in &self.entries {
            let (x, y) = (entry.x as usize, entry.y as usize);
            if x >= dimension || y >= dimension {
                return Err(Error::OutOfRange { x, y, dimension });
            }
            output[[x, y]] = entry.value;
            output[[y, x]] = entry.value;
        }
        Ok(output)
    }

    pub fn trace(&self) -> f32 {
        self.entries.iter().filter(|e| e.x == e.y).map(|e| e.value).sum()
    }
}


/// Full square matrix, stored row-major as big-endian f32.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseMatrix(pub Array2<f32>);

impl DenseMatrix {

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.0.len() * 4);
        for value in self.0.iter() {
            buf.extend_from_slice(&value.to_be_bytes());
        }
        buf
    }

    /// The side is inferred from the value count, which has to be a perfect square.
    pub fn decode(bytes: &[u8], source: &Path) -> Result<Self> {

        if bytes.len() % 4 != 0 {
            return Err(Error::CorruptMatrix { path: source.to_path_buf(), len: bytes.len(), record: 4 });
        }
        let values: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        let dimension = (values.len() as f64).sqrt().round() as usize;
        if dimension * dimension != values.len() {
            return Err(Error::parse(format!("{} values in {:?} do not form a square matrix", values.len(), source)));
        }
        let matrix = Array2::from_shape_vec((dimension, dimension), values)
            .map_err(|e| Error::parse(e.to_string()))?;
        Ok(Self(matrix))
    }
}


/// Self-describing matrix for the bincode back end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatrixRecord {
    pub word: String,
    pub dimension: usize,
    pub cutoff: Option<usize>,
    pub entries: Vec<Entry>,
}


/// Contents of `parameters.txt`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parameters {
    pub dimension: usize,
    /// only written in soft cutoff mode
    pub cutoff: Option<usize>,
}

impl Parameters {

    pub fn for_vocab(vocab: &Vocabulary) -> Self {
        if vocab.soft_cutoff() {
            Self { dimension: vocab.len(), cutoff: Some(vocab.cutoff()) }
        } else {
            Self { dimension: vocab.cutoff(), cutoff: None }
        }
    }

    fn parse(text: &str) -> Result<Self> {

        let mut dimension = None;
        let mut cutoff = None;
        for line in text.lines() {
            let mut fields = line.split_whitespace();
            let (key, value) = match (fields.next(), fields.next()) {
                (Some(key), Some(value)) => (key, value),
                _ => continue,
            };
            let value: usize = value
                .parse()
                .map_err(|_| Error::parse(format!("bad value for {}: {}", key, value)))?;
            match key {
                "dimension" => dimension = Some(value),
                "cutoff" => cutoff = Some(value),
                _ => {}
            }
        }

        let dimension = dimension.ok_or_else(|| Error::parse("parameters without a dimension"))?;
        Ok(Self { dimension, cutoff })
    }
}


/// Vocabulary words in rank order, one per line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Wordmap(pub Vec<String>);

impl Wordmap {

    /// Truncated to the cutoff unless the vocabulary has a soft cutoff.
    pub fn for_vocab(vocab: &Vocabulary) -> Self {
        Self(vocab.words()[..vocab.dimension()].to_vec())
    }
}


/// Rows of `vectors.txt`, a word followed by its marginal counts.
pub struct VectorRows {
    pub rows: Vec<(String, Array1<f32>)>,
    /// extend an existing file instead of replacing it
    pub append: bool,
}


pub trait SaveFile {
    fn save_file(&self, output_dir: &Path, file_name: &str) -> Result<()>;
}

pub trait ReadFile: Sized {
    fn read_file(file_path: &Path) -> Result<Self>;
}


// an empty matrix produces no file
impl SaveFile for SparseMatrix {
    fn save_file(&self, output_dir: &Path, file_name: &str) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let out = output_dir.join(format!("{}.bin", file_name));
        let mut f = BufWriter::new(File::create(out)?);
        f.write_all(&self.encode())?;
        f.flush()?;
        Ok(())
    }
}

impl ReadFile for SparseMatrix {
    fn read_file(file_path: &Path) -> Result<Self> {
        let bytes = fs::read(file_path)?;
        Self::decode(&bytes, file_path)
    }
}

// an all-zero matrix produces no file
impl SaveFile for DenseMatrix {
    fn save_file(&self, output_dir: &Path, file_name: &str) -> Result<()> {
        if self.is_zero() {
            return Ok(());
        }
        let out = output_dir.join(format!("{}.dat", file_name));
        let mut f = BufWriter::new(File::create(out)?);
        f.write_all(&self.encode())?;
        f.flush()?;
        Ok(())
    }
}

impl ReadFile for DenseMatrix {
    fn read_file(file_path: &Path) -> Result<Self> {
        let bytes = fs::read(file_path)?;
        Self::decode(&bytes, file_path)
    }
}

impl SaveFile for MatrixRecord {
    fn save_file(&self, output_dir: &Path, file_name: &str) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let out = output_dir.join(format!("{}.bincode", file_name));
        let mut f = BufWriter::new(File::create(out)?);
        bincode::serialize_into(&mut f, self)?;
        f.flush()?;
        Ok(())
    }
}

impl ReadFile for MatrixRecord {
    fn read_file(file_path: &Path) -> Result<Self> {
        let f = BufReader::new(File::open(file_path)?);
        Ok(bincode::deserialize_from(f)?)
    }
}

impl SaveFile for Parameters {
    fn save_file(&self, output_dir: &Path, file_name: &str) -> Result<()> {
        let out = output_dir.join(format!("{}.txt", file_name));
        let mut f = BufWriter::new(File::create(out)?);
        writeln!(f, "dimension {}", self.dimension)?;
        if let Some(cutoff) = self.cutoff {
            writeln!(f, "cutoff {}", cutoff)?;
        }
        f.flush()?;
        Ok(())
    }
}

impl ReadFile for Parameters {
    fn read_file(file_path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(file_path)?)
    }
}

impl SaveFile for Wordmap {
    fn save_file(&self, output_dir: &Path, file_name: &str) -> Result<()> {
        let out = output_dir.join(format!("{}.txt", file_name));
        let mut f = BufWriter::new(File::create(out)?);
        for word in &self.0 {
            writeln!(f, "{}", word)?;
        }
        f.flush()?;
        Ok(())
    }
}

impl ReadFile for Wordmap {
    fn read_file(file_path: &Path) -> Result<Self> {
        let f = BufReader::new(File::open(file_path)?);
        let words = f.lines().collect::<std::io::Result<Vec<String>>>()?;
        Ok(Self(words))
    }
}

impl SaveFile for VectorRows {
    fn save_file(&self, output_dir: &Path, file_name: &str) -> Result<()> {

        let out = output_dir.join(format!("{}.txt", file_name));
        let f = OpenOptions::new()
            .create(true)
            .write(true)
            .append(self.append)
            .truncate(!self.append)
            .open(out)?;
        let mut f = BufWriter::new(f);

        for (word, vector) in &self.rows {
            write!(f, "{}", word)?;
            for value in vector.iter() {
                write!(f, " {}", value)?;
            }
            writeln!(f)?;
        }
        f.flush()?;
        Ok(())
    }
}
