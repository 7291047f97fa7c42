//! Fixed per-dataset directory layout.
//!
//! ```text
//! <workspace>/Data/<dataset>_<centers>/      inputs, codec assets, transforms
//! <workspace>/output/<dataset>_<centers>/    deformed references, fitted meshes
//! <reconstruction dir>/                      decoded_<dataset>_fr0<iii>.obj
//! ```

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    data_dir: PathBuf,
    output_dir: PathBuf,
    dataset: String,
    group: String,
    file_name_prefix: String,
    reconstruction_dir: PathBuf,
}

impl DatasetLayout {
    pub fn new(workspace: &Path, dataset: &str, num_centers: usize, num_frames: usize) -> Self {
        let key = format!("{dataset}_{num_centers}");
        let output_dir = workspace.join("output").join(&key);
        Self {
            data_dir: workspace.join("Data").join(&key),
            reconstruction_dir: output_dir.join("reconstructed"),
            output_dir,
            dataset: dataset.to_string(),
            group: format!("GoF{num_frames}"),
            file_name_prefix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.file_name_prefix = prefix.to_string();
        self
    }

    pub fn with_reconstruction_dir(mut self, dir: &Path) -> Self {
        self.reconstruction_dir = dir.to_path_buf();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn frame_mesh(&self, frame: usize) -> PathBuf {
        self.data_dir
            .join("meshes")
            .join(format!("{}{frame:03}.obj", self.file_name_prefix))
    }

    pub fn centers_dir(&self) -> PathBuf {
        self.data_dir.join("centers")
    }

    pub fn reference_centers(&self) -> PathBuf {
        self.data_dir
            .join("reference_center")
            .join("reference_centers_aligned.xyz")
    }

    pub fn distance_matrix(&self, num_frames: usize, num_centers: usize) -> PathBuf {
        self.centers_dir().join(format!(
            "{}_distance_matrix_{num_frames}_{num_centers}.txt",
            self.dataset
        ))
    }

    fn reference_mesh_dir(&self) -> PathBuf {
        self.data_dir.join("reference_mesh")
    }

    pub fn decimated_reference(&self) -> PathBuf {
        self.reference_mesh_dir().join("decimated_reference_mesh.obj")
    }

    pub fn encoded_reference(&self) -> PathBuf {
        self.reference_mesh_dir()
            .join("encoded_decimated_reference_mesh.drc")
    }

    pub fn decoded_reference(&self) -> PathBuf {
        self.reference_mesh_dir()
            .join("decode_decimated_reference_mesh.obj")
    }

    pub fn displacement_points(&self, frame: usize) -> PathBuf {
        self.reference_mesh_dir()
            .join(format!("dis_{}_{frame:03}.ply", self.dataset))
    }

    /// Codec assets of one group of frames.
    pub fn group_dir(&self) -> PathBuf {
        self.reference_mesh_dir().join(&self.group)
    }

    pub fn encoded_displacement(&self, frame: usize) -> PathBuf {
        self.group_dir()
            .join(format!("dis_{}_{frame:03}.drc", self.dataset))
    }

    pub fn decoded_displacement(&self, frame: usize) -> PathBuf {
        self.group_dir()
            .join(format!("decoded_{}_{frame:03}_displacements.ply", self.dataset))
    }

    fn reference_output_dir(&self) -> PathBuf {
        self.output_dir.join("reference")
    }

    pub fn deformed_reference(&self, frame: usize) -> PathBuf {
        self.reference_output_dir()
            .join(format!("deformed_reference_mesh_{frame:03}.obj"))
    }

    pub fn fitting_mesh(&self, frame: usize) -> PathBuf {
        self.reference_output_dir()
            .join(format!("fitting_mesh_{frame:03}.obj"))
    }

    pub fn raw_displacements(&self, frame: usize) -> PathBuf {
        self.reference_output_dir()
            .join(format!("displacements_{}_{frame:03}.txt", self.dataset))
    }

    pub fn reconstruction_dir(&self) -> &Path {
        &self.reconstruction_dir
    }

    pub fn reconstructed(&self, frame: usize) -> PathBuf {
        self.reconstruction_dir
            .join(format!("decoded_{}_fr0{frame:03}.obj", self.dataset))
    }

    pub fn transformations(&self, frame: usize) -> PathBuf {
        self.data_dir.join(format!("transformations_{frame:03}.txt"))
    }

    pub fn inverse_transformations(&self, frame: usize) -> PathBuf {
        self.data_dir
            .join(format!("inverse_transformations_{frame:03}.txt"))
    }

    pub fn indices(&self, frame: usize) -> PathBuf {
        self.data_dir.join(format!("indices_{frame:03}.txt"))
    }
}
