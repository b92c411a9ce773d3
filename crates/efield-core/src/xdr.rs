//! Big-endian XDR primitives used by the archive record.

use std::io::{self, Read, Write};

use crate::codec::Precision;

pub(crate) struct XdrWriter<'a, W: Write + ?Sized> {
    inner: &'a mut W,
    precision: Precision,
}

impl<'a, W: Write + ?Sized> XdrWriter<'a, W> {
    pub(crate) fn new(inner: &'a mut W, precision: Precision) -> Self {
        Self { inner, precision }
    }

    pub(crate) fn put_int(&mut self, value: i32) -> io::Result<()> {
        self.inner.write_all(&value.to_be_bytes())
    }

    pub(crate) fn put_reals(&mut self, values: &[f64]) -> io::Result<()> {
        for &value in values {
            match self.precision {
                Precision::Single => self.inner.write_all(&(value as f32).to_be_bytes())?,
                Precision::Double => self.inner.write_all(&value.to_be_bytes())?,
            }
        }
        Ok(())
    }
}

pub(crate) struct XdrReader<'a, R: Read + ?Sized> {
    inner: &'a mut R,
    precision: Precision,
}

impl<'a, R: Read + ?Sized> XdrReader<'a, R> {
    pub(crate) fn new(inner: &'a mut R, precision: Precision) -> Self {
        Self { inner, precision }
    }

    pub(crate) fn get_int(&mut self) -> io::Result<i32> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    /// Fill `values` with reals read from the stream.
    pub(crate) fn get_reals(&mut self, values: &mut [f64]) -> io::Result<()> {
        for value in values.iter_mut() {
            *value = match self.precision {
                Precision::Single => {
                    let mut buf = [0u8; 4];
                    self.inner.read_exact(&mut buf)?;
                    f32::from_be_bytes(buf) as f64
                }
                Precision::Double => {
                    let mut buf = [0u8; 8];
                    self.inner.read_exact(&mut buf)?;
                    f64::from_be_bytes(buf)
                }
            };
        }
        Ok(())
    }
}
