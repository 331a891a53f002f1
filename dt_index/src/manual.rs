/*!

This is the long-form manual for `dt_index` and `dtindex`.

## The index

Every row of the input is one firm for one year (period). Besides the identifier
and the name of the firm, the row holds keyword counts taken from the annual
report: how often terms about artificial intelligence, big data, cloud computing,
blockchain or the use of digital technologies appear. Each of these counts is an
*indicator*.

The index is built in five steps:
1. the rows with a missing identifier, name or count are dropped
2. every indicator is standardized to zero mean and unit variance
3. a principal component analysis of the standardized indicators keeps the
   leading components that explain at least 85% of the variance (configurable)
4. the weight of an indicator is the sum of the absolute values of its loadings
   in the retained components, normalized so that all weights sum to 1
5. the index of a row is the weighted sum of its standardized indicators,
   rescaled so that the lowest row gets 0 and the highest row gets 100

Degenerate inputs get a defined value instead of an error:
- an indicator that has the same value in all rows is standardized to 0 and
  gets a weight of 0. If all the indicators are in this case, they all get the
  same weight.
- if all the rows end up with the same score, they all get the index 50.

## Input formats

The following formats are supported:
* `xlsx` Excel spreadsheet
* `csv` Comma Separated Values

In both cases, the first row is the header. The columns are recognized by their
names:

|  股票代码 | 企业名称 | 年份 | 行业名称 | 人工智能词频数 | 大数据词频数 | ... |
|----------|---------|------|---------|--------------|-------------|-----|
| 000001   | 平安银行 | 2013 | 货币金融服务 | 3          | 12          |     |
| 600519   | 贵州茅台 | 2013 |         | 0            | 1           |     |

- the identifier (`股票代码`) and the name (`企业名称`) are mandatory.
  Numeric identifiers are padded with zeros to 6 digits. `未知` marks an
  unknown identifier and is kept as is.
- the period (`年份`) is optional and passed through.
- the label columns (`行业名称`, `行业代码`) are optional and passed through. An
  empty or absent label is replaced by `未知行业` (industry name) or `未知`
  (industry code).
- every other column is an indicator. The declared indicators that are not in
  the input are reported and ignored.

### `xlsx`

The first worksheet is used, unless a worksheet name is provided.

### `csv`

The file is expected to be encoded in UTF-8 and to use commas.

```text
股票代码,企业名称,年份,人工智能词频数,大数据词频数
1,平安银行,2013,3,12
600519,贵州茅台,2013,0,1
```

## Outputs

Four files are written in the output directory, named after the dataset:
- `<name>_1_cleaned.csv`: the rows that were kept, with their counts
- `<name>_2_standardized.csv`: the standardized indicators
- `<name>_3_weights.csv`: the weight of every indicator
- `<name>_4_index.csv`: the index (0-100) of every row with the counts and their total

An existing file is never overwritten: a timestamp is appended to the name of
the new file instead.

A summary of the run in JSON is also written, by default to
`<name>_summary.json` in the output directory. `--summary stdout` prints it
instead. With `--reference`, the summary is compared to a previous summary and
any difference is an error.

## Configuration

`dtindex` comes with defaults for the annual-report keyword statistics, and all
of them can be changed with a configuration file in JSON:

```json
{
  "outputSettings": {
    "datasetName": "2013年数字化转型指数结果表",
    "outputDirectory": "out",
    "summaryPath": "out/summary.json"
  },
  "fileSources": [
    { "provider": "xlsx", "filePath": "2013年年报技术关键词统计.xlsx" },
    { "provider": "csv", "filePath": "2014.csv" }
  ],
  "columns": {
    "idColumn": "股票代码",
    "nameColumn": "企业名称",
    "periodColumn": "年份",
    "labelColumns": [{ "name": "行业名称", "default": "未知行业" }],
    "unknownId": "未知",
    "idWidth": 6
  },
  "indicators": ["人工智能词频数", "大数据词频数", "云计算词频数", "区块链词频数", "数字技术运用词频数"],
  "rules": { "varianceThreshold": 0.85 }
}
```

All the sections except `fileSources` are optional. The paths are relative to
the directory of the configuration file. The rows of all the file sources are
concatenated before the index is computed.

The command line flags override the configuration file:
- `--input` and `--input-type` replace the file sources
- `--indicators` replaces the declared indicators
- `--threshold` replaces `varianceThreshold`
- `--out` replaces `outputDirectory`
- `--summary` replaces `summaryPath`

The paths given on the command line are relative to the working directory.

 */
