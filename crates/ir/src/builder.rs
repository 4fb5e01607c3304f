//! Dialect-neutral pieces of an emitted dispatch: the function signature,
//! the linalg computation and the optional `compilation_info` attribute.

use crate::dialect::{tensor_type, MlirDialect};
use dispatchgen_library::{
    Conv2dConfiguration, Conv2dLayout, DispatchDescriptor, DispatchError, MatmulConfiguration,
    MatrixLayout, Result, TileDescription, TuningConfiguration,
};
use std::fmt::Write;

/// Function arguments, result type and the ops computing the result.
#[derive(Debug, Clone)]
pub struct DispatchBody {
    pub name: String,
    pub arguments: Vec<(&'static str, String)>,
    pub result_type: String,
    pub compilation_info: Option<String>,
    prelude: Vec<String>,
    compute: String,
}

impl DispatchBody {
    pub fn build(descriptor: &DispatchDescriptor, dialect: MlirDialect) -> Result<Self> {
        match descriptor.configuration() {
            TuningConfiguration::Matmul(config) => matmul_body(descriptor, config, dialect),
            TuningConfiguration::Conv2d(config) => conv2d_body(descriptor, config, dialect),
        }
    }

    /// `func.func @name(%lhs: ..., %rhs: ...) -> T {`
    pub fn function_header(&self) -> String {
        let arguments = self
            .arguments
            .iter()
            .map(|(name, ty)| format!("%{}: {}", name, ty))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "func.func @{}({}) -> {} {{",
            self.name, arguments, self.result_type
        )
    }

    /// Writes the computation, binding its final value to `%{result}`.
    pub fn write_ops(&self, out: &mut String, indent: &str, result: &str) {
        for line in &self.prelude {
            let _ = writeln!(out, "{}{}", indent, line);
        }
        let _ = writeln!(out, "{}%{} = {}", indent, result, self.compute);
    }

    /// Module-level attribute alias definition, if the dispatch pins a tile.
    pub fn write_attribute_aliases(&self, out: &mut String) {
        if let Some(alias) = &self.compilation_info {
            out.push_str(alias);
            out.push('\n');
        }
    }
}

fn alias_name(descriptor: &DispatchDescriptor) -> String {
    format!("{}_config", descriptor.name())
}

fn compilation_info_alias(
    descriptor: &DispatchDescriptor,
    tile: &TileDescription,
    tile_sizes: &[usize],
) -> String {
    let sizes = tile_sizes
        .iter()
        .map(|size| size.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let [x, y, z] = tile.workgroup_size;
    let mut text = String::new();
    let _ = writeln!(
        text,
        "#{} = #iree_codegen.compilation_info<",
        alias_name(descriptor)
    );
    let _ = writeln!(text, "  lowering_config = <tile_sizes = [[{}]]>,", sizes);
    let _ = writeln!(
        text,
        "  translation_info = <{} pipeline_depth = {}>,",
        tile.translation.pipeline_name(),
        tile.stages
    );
    let _ = writeln!(text, "  workgroup_size = [{}, {}, {}]", x, y, z);
    text.push('>');
    text
}

fn attribute_dict(entries: &[String]) -> String {
    if entries.is_empty() {
        String::new()
    } else {
        format!("{{{}}} ", entries.join(", "))
    }
}

fn fill_prelude(result_type: &str, zero: &str, element: &str) -> Vec<String> {
    vec![
        format!("%c0 = arith.constant {} : {}", zero, element),
        format!("%init = tensor.empty() : {}", result_type),
        format!(
            "%initial_result = linalg.fill ins(%c0 : {}) outs(%init : {}) -> {}",
            element, result_type, result_type
        ),
    ]
}

fn unsupported(descriptor: &DispatchDescriptor, dialect: MlirDialect, reason: &str) -> DispatchError {
    DispatchError::UnsupportedOperation {
        dialect: dialect.to_string(),
        dispatch: descriptor.name().to_string(),
        reason: reason.to_string(),
    }
}

fn matmul_body(
    descriptor: &DispatchDescriptor,
    config: &MatmulConfiguration,
    dialect: MlirDialect,
) -> Result<DispatchBody> {
    let (m, n, k) = (config.m, config.n, config.k);
    if config.result.layout != MatrixLayout::RowMajor {
        return Err(unsupported(
            descriptor,
            dialect,
            "matmul result must be row-major",
        ));
    }
    let (op, lhs_shape, rhs_shape) = match (config.lhs.layout, config.rhs.layout) {
        (MatrixLayout::RowMajor, MatrixLayout::RowMajor) => ("linalg.matmul", [m, k], [k, n]),
        (MatrixLayout::RowMajor, MatrixLayout::ColumnMajor) => {
            ("linalg.matmul_transpose_b", [m, k], [n, k])
        }
        (MatrixLayout::ColumnMajor, MatrixLayout::RowMajor) => {
            ("linalg.matmul_transpose_a", [k, m], [k, n])
        }
        (MatrixLayout::ColumnMajor, MatrixLayout::ColumnMajor) => {
            return Err(unsupported(
                descriptor,
                dialect,
                "no named linalg op for column-major lhs and rhs",
            ));
        }
    };

    let lhs_ty = tensor_type(&lhs_shape, config.lhs.element);
    let rhs_ty = tensor_type(&rhs_shape, config.rhs.element);
    let result_ty = tensor_type(&[m, n], config.result.element);

    let compilation_info = config.tiling.custom().map(|tile| {
        let [tm, tn, tk] = tile.threadblock;
        compilation_info_alias(descriptor, tile, &[tm, tn, tk])
    });
    let mut attributes = Vec::new();
    if compilation_info.is_some() {
        attributes.push(format!("compilation_info = #{}", alias_name(descriptor)));
    }

    let compute = format!(
        "{} {}ins(%lhs, %rhs : {}, {}) outs(%initial_result : {}) -> {}",
        op,
        attribute_dict(&attributes),
        lhs_ty,
        rhs_ty,
        result_ty,
        result_ty
    );

    Ok(DispatchBody {
        name: descriptor.name().to_string(),
        prelude: fill_prelude(
            &result_ty,
            config.result.element.zero_literal(),
            config.result.element.element_type(),
        ),
        arguments: vec![("lhs", lhs_ty), ("rhs", rhs_ty)],
        result_type: result_ty,
        compilation_info,
        compute,
    })
}

fn dense_pair(values: [usize; 2]) -> String {
    if values[0] == values[1] {
        format!("dense<{}> : tensor<2xi64>", values[0])
    } else {
        format!("dense<[{}, {}]> : tensor<2xi64>", values[0], values[1])
    }
}

fn conv2d_body(
    descriptor: &DispatchDescriptor,
    config: &Conv2dConfiguration,
    dialect: MlirDialect,
) -> Result<DispatchBody> {
    let output_shape = config.output_shape().ok_or_else(|| {
        unsupported(descriptor, dialect, "output shape is undefined for this geometry")
    })?;

    let input_ty = tensor_type(&config.input_shape(), config.input);
    let filter_ty = tensor_type(&config.filter_shape(), config.filter);
    let result_ty = tensor_type(&output_shape, config.result);

    let op = match config.layout {
        Conv2dLayout::NhwcHwcf => "linalg.conv_2d_nhwc_hwcf",
        Conv2dLayout::NchwFchw => "linalg.conv_2d_nchw_fchw",
    };

    // Loop order: nhwc_hwcf (n, oh, ow, f, kh, kw, c); nchw_fchw (n, f, oh, ow, c, kh, kw).
    let compilation_info = config.tiling.custom().map(|tile| {
        let [tm, tn, tk] = tile.threadblock;
        let tile_sizes = match config.layout {
            Conv2dLayout::NhwcHwcf => [1, 1, tm, tn, 1, 1, tk],
            Conv2dLayout::NchwFchw => [1, tn, 1, tm, tk, 1, 1],
        };
        compilation_info_alias(descriptor, tile, &tile_sizes)
    });

    let mut attributes = Vec::new();
    if compilation_info.is_some() {
        attributes.push(format!("compilation_info = #{}", alias_name(descriptor)));
    }
    attributes.push(format!("dilations = {}", dense_pair(config.dilations)));
    attributes.push(format!("strides = {}", dense_pair(config.strides)));

    let compute = format!(
        "{} {}ins(%input, %filter : {}, {}) outs(%initial_result : {}) -> {}",
        op,
        attribute_dict(&attributes),
        input_ty,
        filter_ty,
        result_ty,
        result_ty
    );

    Ok(DispatchBody {
        name: descriptor.name().to_string(),
        prelude: fill_prelude(
            &result_ty,
            config.result.zero_literal(),
            config.result.element_type(),
        ),
        arguments: vec![("input", input_ty), ("filter", filter_ty)],
        result_type: result_ty,
        compilation_info,
        compute,
    })
}
